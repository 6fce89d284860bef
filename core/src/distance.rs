//! Distance lookup and the per-scenario kilometre matrix.

use crate::{
    matrix::{Grid, IdIndex},
    model::DistanceRecord,
    types::{CellId, MarketId, UNREACHABLE},
};
use std::collections::HashMap;

/// Lookup of precomputed market <-> cell distances.
#[derive(Debug, Clone, Default)]
pub struct DistanceIndex {
    entries: HashMap<(MarketId, CellId), (f64, f64)>,
}

impl DistanceIndex {
    pub fn new(records: &[DistanceRecord]) -> Self {
        let entries = records
            .iter()
            .map(|r| ((r.market_id, r.cell_id), (r.routed_m, r.beeline_m)))
            .collect();
        Self { entries }
    }

    /// `(routed_m, beeline_m)` of a pair. Missing pairs and negative routed
    /// distances come back with routed distance `UNREACHABLE`.
    pub fn distance(&self, market_id: MarketId, cell_id: CellId) -> (f64, f64) {
        match self.entries.get(&(market_id, cell_id)) {
            Some(&(routed, beeline)) if routed >= 0.0 => (routed, beeline),
            Some(&(_, beeline)) => (UNREACHABLE, beeline),
            None => (UNREACHABLE, 0.0),
        }
    }

    pub fn is_reachable(&self, market_id: MarketId, cell_id: CellId) -> bool {
        self.distance(market_id, cell_id).0 >= 0.0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kilometre matrix for the given markets and cells.
    ///
    /// Routed meters get the normalised beeline distance added before the
    /// conversion, so two markets on the same routed distance still rank
    /// by beeline. `None` marks unreachable pairs.
    pub fn km_matrix(&self, markets: &IdIndex, cells: &IdIndex) -> Grid<Option<f64>> {
        let max_beeline = markets
            .ids()
            .iter()
            .flat_map(move |&m| cells.ids().iter().map(move |&c| (m, c)))
            .map(|(m, c)| self.distance(m, c))
            .filter(|(routed, _)| *routed >= 0.0)
            .map(|(_, beeline)| beeline)
            .fold(0.0_f64, f64::max);

        let mut km = Grid::filled(markets.len(), cells.len(), None);
        for (row, &market_id) in markets.ids().iter().enumerate() {
            for (col, &cell_id) in cells.ids().iter().enumerate() {
                let (routed, beeline) = self.distance(market_id, cell_id);
                if routed < 0.0 {
                    continue;
                }
                let perturbation = if max_beeline > 0.0 { beeline / max_beeline } else { 0.0 };
                km.set(row, col, Some((routed + perturbation) / 1000.0));
            }
        }
        km
    }
}
