//! Competitor clustering discounts.
//!
//! Tiers never compete with each other:
//!   - local providers (outlet type 1): only the nearest few per cell
//!     attract anything, with no discount.
//!   - small markets (type 2) and larger formats (type > 2): markets of the
//!     same chain discount each other depending on how many of them sit
//!     within the cutoff of the nearest one.
//!
//! Every pair outside those rules keeps discount 1. Unreachable pairs get 0
//! and take no part in any ranking.

use crate::{
    attributes::MarketProfile,
    config::{AttractivityFactor, ModelConfig},
    matrix::Grid,
    model::OutletTier,
    types::{ChainId, NO_CHAIN},
};
use std::collections::BTreeMap;

/// Same-chain markets beyond this rank get nothing from a cell.
pub const CLUSTER_DEPTH: usize = 3;

const REL_TOLERANCE: f64 = 1e-5;
const ABS_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearCount {
    One,
    Two,
    Three,
}

impl NearCount {
    fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(NearCount::One),
            2 => Some(NearCount::Two),
            3 => Some(NearCount::Three),
            _ => None,
        }
    }
}

/// Position of a far market behind the near group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPosition {
    /// Ranked 2nd, only the 1st is near.
    SecondAfterOne,
    /// Ranked 3rd, only the 1st is near.
    ThirdAfterOne,
    /// Ranked 3rd, 1st and 2nd are near.
    ThirdAfterTwo,
}

/// How a same-chain market relates to its siblings for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterClass {
    /// Within the cutoff of the nearest sibling; `count` near markets in total.
    Near { count: NearCount },
    /// In the top ranks but beyond the cutoff.
    FarWithGap(GapPosition),
    /// Ranked beyond `CLUSTER_DEPTH`.
    Excluded,
}

impl ClusterClass {
    pub fn coefficient(self, factor: &AttractivityFactor) -> f64 {
        match self {
            ClusterClass::Near { count: NearCount::One }   => factor.one_near,
            ClusterClass::Near { count: NearCount::Two }   => factor.two_near,
            ClusterClass::Near { count: NearCount::Three } => factor.three_near,
            ClusterClass::FarWithGap(GapPosition::SecondAfterOne) => factor.second_with_gap,
            ClusterClass::FarWithGap(GapPosition::ThirdAfterOne)  => factor.third_with_gap_to_first,
            ClusterClass::FarWithGap(GapPosition::ThirdAfterTwo)  => {
                factor.third_with_gap_to_first_and_second
            }
            ClusterClass::Excluded => 0.0,
        }
    }
}

/// `delta < cutoff`, with deltas numerically equal to the cutoff counting as near.
pub fn is_near(delta_km: f64, cutoff_km: f64) -> bool {
    delta_km < cutoff_km || (delta_km - cutoff_km).abs() <= ABS_TOLERANCE + REL_TOLERANCE * cutoff_km.abs()
}

/// Classify same-chain markets for one cell.
///
/// `deltas` are the distances to the nearest sibling, in rank order
/// (ascending, first entry 0). Returns one class per entry.
pub fn classify_ranked(deltas: &[f64], cutoff_km: f64) -> Vec<ClusterClass> {
    let near_count = deltas
        .iter()
        .take(CLUSTER_DEPTH)
        .take_while(|delta| is_near(**delta, cutoff_km))
        .count();

    deltas
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let rank = idx + 1;
            if rank <= near_count {
                // near_count is 1..=3 here since rank >= 1
                return NearCount::from_count(near_count)
                    .map(|count| ClusterClass::Near { count })
                    .unwrap_or(ClusterClass::Excluded);
            }
            match (rank, near_count) {
                (2, 1) => ClusterClass::FarWithGap(GapPosition::SecondAfterOne),
                (3, 1) => ClusterClass::FarWithGap(GapPosition::ThirdAfterOne),
                (3, 2) => ClusterClass::FarWithGap(GapPosition::ThirdAfterTwo),
                _ => ClusterClass::Excluded,
            }
        })
        .collect()
}

/// Discount matrix with the same shape as `km` (rows follow `profiles`).
pub fn clustering_discounts(
    profiles: &[MarketProfile],
    km: &Grid<Option<f64>>,
    config: &ModelConfig,
) -> Grid<f64> {
    let mut discounts = Grid::filled(km.rows(), km.cols(), 1.0);

    for row in 0..km.rows() {
        for col in 0..km.cols() {
            if km.get(row, col).is_none() {
                discounts.set(row, col, 0.0);
            }
        }
    }

    let local_rows: Vec<usize> = rows_in_tier(profiles, OutletTier::LocalProvider).collect();
    apply_local_provider_slots(&local_rows, km, config.local_provider_slots, &mut discounts);

    for tier in [OutletTier::SmallMarket, OutletTier::LargeFormat] {
        let mut chains: BTreeMap<ChainId, Vec<usize>> = BTreeMap::new();
        for row in rows_in_tier(profiles, tier) {
            let chain_id = profiles[row].chain_id;
            if chain_id != NO_CHAIN {
                chains.entry(chain_id).or_default().push(row);
            }
        }
        for (chain_id, rows) in chains {
            if rows.len() < 2 {
                continue;
            }
            log::debug!("clustering chain {chain_id} ({tier:?}): {} markets", rows.len());
            apply_chain_clustering(&rows, profiles, km, config.cluster_cutoff_km, &mut discounts);
        }
    }

    discounts
}

fn rows_in_tier(profiles: &[MarketProfile], tier: OutletTier) -> impl Iterator<Item = usize> + '_ {
    profiles
        .iter()
        .enumerate()
        .filter(move |(_, p)| p.tier == tier)
        .map(|(row, _)| row)
}

/// Reachable `(distance, row)` pairs of `rows` for one cell, nearest first.
/// Equal distances keep row order.
fn ranked_for_cell(rows: &[usize], km: &Grid<Option<f64>>, col: usize) -> Vec<(f64, usize)> {
    let mut ranked: Vec<(f64, usize)> = rows
        .iter()
        .filter_map(|&row| km.get(row, col).map(|d| (d, row)))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    ranked
}

fn apply_local_provider_slots(
    rows: &[usize],
    km: &Grid<Option<f64>>,
    slots: usize,
    discounts: &mut Grid<f64>,
) {
    if rows.is_empty() {
        return;
    }
    for col in 0..km.cols() {
        for (rank, (_, row)) in ranked_for_cell(rows, km, col).into_iter().enumerate() {
            discounts.set(row, col, if rank < slots { 1.0 } else { 0.0 });
        }
    }
}

fn apply_chain_clustering(
    rows: &[usize],
    profiles: &[MarketProfile],
    km: &Grid<Option<f64>>,
    cutoff_km: f64,
    discounts: &mut Grid<f64>,
) {
    for col in 0..km.cols() {
        let ranked = ranked_for_cell(rows, km, col);
        let Some(&(nearest, _)) = ranked.first() else {
            continue;
        };
        let deltas: Vec<f64> = ranked.iter().map(|(d, _)| d - nearest).collect();
        for ((_, row), class) in ranked.iter().zip(classify_ranked(&deltas, cutoff_km)) {
            discounts.set(*row, col, class.coefficient(&profiles[*row].attractivity));
        }
    }
}
