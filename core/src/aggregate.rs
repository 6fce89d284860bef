//! Downstream summaries over the flow table: sales change per market and
//! centrality per community.
//!
//! Both work on `FlowResult` rows so they can run on freshly computed
//! results as well as on rows read back from the store.

use crate::{
    model::{Cell, Market, Scenario},
    scenario::{includes_cell, FlowResult},
    types::{Ags, MarketId},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSales {
    pub market_id:        MarketId,
    pub name:             String,
    pub sales_status_quo: f64,
    pub sales_planned:    f64,
    pub change:           f64,
    /// Relative change in percent; `None` for markets without status quo sales.
    pub change_percent:   Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    pub ags: Ags,
    pub purchasing_power_status_quo: f64,
    pub purchasing_power_planned:    f64,
    pub sales_status_quo:            f64,
    pub sales_planned:               f64,
    pub sales_area_status_quo:       f64,
    pub sales_area_planned:          f64,
    /// Sales of the community's markets over its own purchasing power.
    pub centrality_status_quo:       Option<f64>,
    pub centrality_planned:          Option<f64>,
}

/// Per-market totals, ordered by market id. Markets without any flow are included.
pub fn market_sales(markets: &[Market], flows: &[FlowResult]) -> Vec<MarketSales> {
    let mut totals: HashMap<MarketId, (f64, f64)> = HashMap::new();
    for row in flows {
        let entry = totals.entry(row.market_id).or_default();
        entry.0 += row.flow_status_quo;
        entry.1 += row.flow_planned;
    }

    let mut sales: Vec<MarketSales> = markets
        .iter()
        .map(|m| {
            let (sq, pl) = totals.get(&m.id).copied().unwrap_or_default();
            MarketSales {
                market_id:        m.id,
                name:             m.name.clone(),
                sales_status_quo: sq,
                sales_planned:    pl,
                change:           pl - sq,
                change_percent:   (sq > 0.0).then(|| (pl - sq) / sq * 100.0),
            }
        })
        .collect();
    sales.sort_by_key(|s| s.market_id);
    sales
}

/// Per-community totals, ordered by AGS.
pub fn community_summary(
    markets: &[Market],
    cells: &[Cell],
    flows: &[FlowResult],
) -> Vec<CommunitySummary> {
    let mut by_ags: BTreeMap<Ags, CommunitySummary> = BTreeMap::new();

    for cell in cells {
        let summary = summary_for(&mut by_ags, &cell.ags);
        if includes_cell(cell, Scenario::StatusQuo) {
            summary.purchasing_power_status_quo += cell.purchasing_power;
        }
        if includes_cell(cell, Scenario::Planned) {
            summary.purchasing_power_planned += cell.purchasing_power;
        }
    }

    for market in markets {
        let summary = summary_for(&mut by_ags, &market.ags);
        if market.exists_in(Scenario::StatusQuo) {
            summary.sales_area_status_quo += market.sales_area;
        }
        if market.exists_in(Scenario::Planned) {
            summary.sales_area_planned += market.sales_area;
        }
    }

    let market_ags: HashMap<MarketId, &Ags> = markets.iter().map(|m| (m.id, &m.ags)).collect();
    for row in flows {
        let Some(ags) = market_ags.get(&row.market_id) else {
            log::warn!("flow row for unknown market {}", row.market_id);
            continue;
        };
        let summary = summary_for(&mut by_ags, ags);
        summary.sales_status_quo += row.flow_status_quo;
        summary.sales_planned += row.flow_planned;
    }

    by_ags
        .into_values()
        .map(|mut s| {
            s.centrality_status_quo = ratio(s.sales_status_quo, s.purchasing_power_status_quo);
            s.centrality_planned = ratio(s.sales_planned, s.purchasing_power_planned);
            s
        })
        .collect()
}

fn summary_for<'a>(
    by_ags: &'a mut BTreeMap<Ags, CommunitySummary>,
    ags: &Ags,
) -> &'a mut CommunitySummary {
    by_ags.entry(ags.clone()).or_insert_with(|| CommunitySummary {
        ags: ags.clone(),
        purchasing_power_status_quo: 0.0,
        purchasing_power_planned:    0.0,
        sales_status_quo:            0.0,
        sales_planned:               0.0,
        sales_area_status_quo:       0.0,
        sales_area_planned:          0.0,
        centrality_status_quo:       None,
        centrality_planned:          None,
    })
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}
