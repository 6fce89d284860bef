//! Huff-style gravity allocation of purchasing power.

use crate::{
    attributes::MarketProfile,
    matrix::{Grid, IdIndex},
    types::{CellId, MarketId},
};

/// Result of one allocation. Rows are markets, columns are cells.
#[derive(Debug, Clone)]
pub struct FlowMatrix {
    pub markets:       IdIndex,
    pub cells:         IdIndex,
    pub attraction:    Grid<f64>,
    pub probabilities: Grid<f64>,
    pub flows:         Grid<f64>,
    /// Allocated purchasing power per cell column.
    pub cell_totals:   Vec<f64>,
}

impl FlowMatrix {
    /// Flow from `cell_id` to `market_id`; 0 for pairs outside the matrix.
    pub fn flow(&self, market_id: MarketId, cell_id: CellId) -> f64 {
        self.lookup(&self.flows, market_id, cell_id)
    }

    pub fn probability(&self, market_id: MarketId, cell_id: CellId) -> f64 {
        self.lookup(&self.probabilities, market_id, cell_id)
    }

    /// Share of the cell's allocated purchasing power captured by the market.
    pub fn binding_share(&self, market_id: MarketId, cell_id: CellId) -> f64 {
        let Some(col) = self.cells.position(cell_id) else {
            return 0.0;
        };
        let total = self.cell_totals[col];
        if total > 0.0 {
            self.flow(market_id, cell_id) / total
        } else {
            0.0
        }
    }

    /// Total purchasing power drawn by one market.
    pub fn market_total(&self, market_id: MarketId) -> f64 {
        self.markets
            .position(market_id)
            .map(|row| self.flows.row_sum(row))
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.flows.values().iter().sum()
    }

    pub fn contains_market(&self, market_id: MarketId) -> bool {
        self.markets.contains(market_id)
    }

    fn lookup(&self, grid: &Grid<f64>, market_id: MarketId, cell_id: CellId) -> f64 {
        match (self.markets.position(market_id), self.cells.position(cell_id)) {
            (Some(row), Some(col)) => *grid.get(row, col),
            _ => 0.0,
        }
    }
}

/// `exp_factor * exp(exponent * km)`; 0 where unreachable.
pub fn attraction_matrix(profiles: &[MarketProfile], km: &Grid<Option<f64>>) -> Grid<f64> {
    let mut attraction = Grid::zeros(km.rows(), km.cols());
    for (row, profile) in profiles.iter().enumerate() {
        for col in 0..km.cols() {
            if let Some(distance) = *km.get(row, col) {
                attraction.set(row, col, profile.raw_attraction(distance));
            }
        }
    }
    attraction
}

/// Normalise per cell. Cells without any attraction get all-zero columns.
pub fn probabilities(attraction: &Grid<f64>) -> Grid<f64> {
    let mut probs = Grid::zeros(attraction.rows(), attraction.cols());
    for col in 0..attraction.cols() {
        let sum = attraction.column_sum(col);
        if sum <= 0.0 || !sum.is_finite() {
            continue;
        }
        for row in 0..attraction.rows() {
            let p = attraction.get(row, col) / sum;
            probs.set(row, col, if p.is_finite() { p } else { 0.0 });
        }
    }
    probs
}

/// Allocate `purchasing_power` (one entry per cell column) to markets.
pub fn allocate(
    profiles: &[MarketProfile],
    markets: IdIndex,
    cells: IdIndex,
    purchasing_power: &[f64],
    km: &Grid<Option<f64>>,
    discounts: &Grid<f64>,
) -> FlowMatrix {
    debug_assert_eq!(profiles.len(), markets.len());
    debug_assert_eq!(purchasing_power.len(), cells.len());

    let attraction = attraction_matrix(profiles, km).zip_map(discounts, |a, d| a * d);
    let probabilities = probabilities(&attraction);

    let mut flows = Grid::zeros(probabilities.rows(), probabilities.cols());
    for (col, power) in purchasing_power.iter().enumerate() {
        for row in 0..probabilities.rows() {
            flows.set(row, col, probabilities.get(row, col) * power);
        }
    }

    let cell_totals = (0..flows.cols()).map(|col| flows.column_sum(col)).collect();

    FlowMatrix { markets, cells, attraction, probabilities, flows, cell_totals }
}
