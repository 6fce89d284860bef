//! Status quo and planned scenario runs.
//!
//! Both scenarios are independent full recomputations over the same
//! distance and reference inputs:
//!   - status quo: markets with a status-quo outlet type, cells outside
//!     planned areas.
//!   - planned:    markets with a planned outlet type, all cells.
//!
//! Profiles and clustering are rebuilt per scenario, since the set of
//! present markets changes who competes with whom.

use crate::{
    attributes::MarketProfile,
    clustering::clustering_discounts,
    config::{BaseData, ModelConfig},
    distance::DistanceIndex,
    error::{ImpactError, ImpactResult},
    gravity::{allocate, FlowMatrix},
    matrix::{Grid, IdIndex},
    model::{Cell, Market, ModelInputs, Scenario},
    progress::{CancelFlag, Monotonic, ProgressSink},
    types::{CellId, MarketId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    pub market_id:        MarketId,
    pub cell_id:          CellId,
    pub flow_status_quo:  f64,
    pub flow_planned:     f64,
    pub share_status_quo: f64,
    pub share_planned:    f64,
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario:  Scenario,
    pub profiles:  Vec<MarketProfile>,
    pub km:        Grid<Option<f64>>,
    pub discounts: Grid<f64>,
    pub matrix:    FlowMatrix,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status_quo: ScenarioOutcome,
    pub planned:    ScenarioOutcome,
    pub flows:      Vec<FlowResult>,
}

/// Reject the run if any planned market still has no provider.
pub fn validate_inputs(markets: &[Market]) -> ImpactResult<()> {
    let offending: Vec<String> = markets
        .iter()
        .filter(|m| m.is_planned() && !m.has_chain())
        .map(|m| m.name.clone())
        .collect();
    if offending.is_empty() {
        Ok(())
    } else {
        Err(ImpactError::Validation { markets: offending })
    }
}

pub fn includes_cell(cell: &Cell, scenario: Scenario) -> bool {
    match scenario {
        Scenario::StatusQuo => !cell.is_in_planned_area(),
        Scenario::Planned   => true,
    }
}

pub struct ScenarioRunner<'a> {
    config:   &'a ModelConfig,
    basedata: &'a BaseData,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(config: &'a ModelConfig, basedata: &'a BaseData) -> Self {
        Self { config, basedata }
    }

    /// Full allocation for one scenario.
    pub fn run_scenario(
        &self,
        scenario: Scenario,
        inputs: &ModelInputs,
        distances: &DistanceIndex,
    ) -> ImpactResult<ScenarioOutcome> {
        let mut markets: Vec<&Market> =
            inputs.markets.iter().filter(|m| m.exists_in(scenario)).collect();
        markets.sort_by_key(|m| m.id);

        let mut cells: Vec<&Cell> =
            inputs.cells.iter().filter(|c| includes_cell(c, scenario)).collect();
        cells.sort_by_key(|c| c.id);

        let mut profiles = Vec::with_capacity(markets.len());
        for market in &markets {
            if let Some(profile) = MarketProfile::resolve(market, scenario, self.basedata)? {
                profiles.push(profile);
            }
        }

        let market_index = IdIndex::new(profiles.iter().map(|p| p.market_id));
        let cell_index = IdIndex::new(cells.iter().map(|c| c.id));
        let purchasing_power: Vec<f64> = cells.iter().map(|c| c.purchasing_power).collect();

        let km = distances.km_matrix(&market_index, &cell_index);
        let discounts = clustering_discounts(&profiles, &km, self.config);
        let matrix = allocate(
            &profiles,
            market_index,
            cell_index,
            &purchasing_power,
            &km,
            &discounts,
        );

        log::debug!(
            "{}: {} markets, {} cells, {:.2} allocated",
            scenario.label(),
            profiles.len(),
            cells.len(),
            matrix.total()
        );

        Ok(ScenarioOutcome { scenario, profiles, km, discounts, matrix })
    }

    /// Validate, run both scenarios and combine them into output rows.
    /// Cancellation is honoured between these phases only.
    pub fn run(
        &self,
        inputs: &ModelInputs,
        sink: &mut dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> ImpactResult<RunOutcome> {
        let mut progress = Monotonic::new(sink);

        check_cancel(cancel, "validation")?;
        validate_inputs(&inputs.markets)?;
        let distances = DistanceIndex::new(&inputs.distances);
        progress.message(&format!(
            "{} markets, {} cells, {} distances",
            inputs.markets.len(),
            inputs.cells.len(),
            distances.len()
        ));
        progress.set(5.0);

        check_cancel(cancel, "status quo allocation")?;
        progress.message("Computing purchasing power flows (status quo)");
        let status_quo = self.run_scenario(Scenario::StatusQuo, inputs, &distances)?;
        progress.set(45.0);

        check_cancel(cancel, "planned allocation")?;
        progress.message("Computing purchasing power flows (planned)");
        let planned = self.run_scenario(Scenario::Planned, inputs, &distances)?;
        progress.set(85.0);

        check_cancel(cancel, "combination")?;
        let flows = combine(&status_quo.matrix, &planned.matrix);
        progress.message(&format!("{} flow rows computed", flows.len()));
        progress.set(100.0);

        Ok(RunOutcome { status_quo, planned, flows })
    }
}

fn check_cancel(cancel: &CancelFlag, phase: &str) -> ImpactResult<()> {
    if cancel.is_cancelled() {
        log::warn!("run cancelled before {phase}");
        return Err(ImpactError::Cancelled { phase: phase.to_string() });
    }
    Ok(())
}

/// Merge both scenario matrices into output rows. Pairs without flow in
/// either scenario are left out. Ordered by market id, then cell id.
pub fn combine(status_quo: &FlowMatrix, planned: &FlowMatrix) -> Vec<FlowResult> {
    let market_ids: BTreeSet<MarketId> = status_quo
        .markets
        .ids()
        .iter()
        .chain(planned.markets.ids())
        .copied()
        .collect();
    let cell_ids: BTreeSet<CellId> = status_quo
        .cells
        .ids()
        .iter()
        .chain(planned.cells.ids())
        .copied()
        .collect();

    let mut rows = Vec::new();
    for &market_id in &market_ids {
        for &cell_id in &cell_ids {
            let flow_status_quo = status_quo.flow(market_id, cell_id);
            let flow_planned = planned.flow(market_id, cell_id);
            if flow_status_quo == 0.0 && flow_planned == 0.0 {
                continue;
            }
            rows.push(FlowResult {
                market_id,
                cell_id,
                flow_status_quo,
                flow_planned,
                share_status_quo: status_quo.binding_share(market_id, cell_id),
                share_planned: planned.binding_share(market_id, cell_id),
            });
        }
    }
    rows
}
