//! The batch engine: one call runs both scenarios against the project store.
//!
//! PHASE ORDER (fixed):
//!   1. Load inputs from the store
//!   2. Validate inputs
//!   3. Status quo allocation
//!   4. Planned allocation
//!   5. Combine and commit results
//!
//! RULES:
//!   - Results are committed only after every phase succeeded.
//!   - Every run leaves a run row and its event log behind, also on failure.
//!   - Runs on the same store must not overlap; the caller serialises them.

use crate::{
    aggregate::{market_sales, MarketSales},
    config::ImpactConfig,
    error::{ImpactError, ImpactResult},
    event::{EventLogEntry, ImpactEvent},
    model::Market,
    progress::{CancelFlag, ProgressSink},
    scenario::{RunOutcome, ScenarioRunner},
    store::{ImpactStore, RunStatus},
    types::RunId,
};

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id:               RunId,
    pub flow_rows:            usize,
    pub allocated_status_quo: f64,
    pub allocated_planned:    f64,
    pub market_sales:         Vec<MarketSales>,
}

pub struct ImpactEngine {
    config: ImpactConfig,
    store:  ImpactStore,
}

impl ImpactEngine {
    pub fn new(config: ImpactConfig, store: ImpactStore) -> Self {
        Self { config, store }
    }

    /// Engine with basedata loaded from `data_dir`.
    pub fn build(store: ImpactStore, data_dir: &str) -> ImpactResult<Self> {
        let config = ImpactConfig::load(data_dir)?;
        Ok(Self::new(config, store))
    }

    /// Engine over a migrated in-memory store with test basedata.
    pub fn build_test() -> ImpactResult<Self> {
        let store = ImpactStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(ImpactConfig::default_test(), store))
    }

    pub fn store(&self) -> &ImpactStore {
        &self.store
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// Run both scenarios and replace the flow table.
    pub fn run(
        &self,
        sink: &mut dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> ImpactResult<RunSummary> {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        self.store.insert_run(&run_id, env!("CARGO_PKG_VERSION"))?;
        let mut events = RunLog::new(&self.store, &run_id);

        let inputs = match self.store.load_inputs() {
            Ok(inputs) => inputs,
            Err(e) => {
                self.record_failure(&mut events, &run_id, &e)?;
                return Err(e);
            }
        };
        events.append(&ImpactEvent::RunStarted {
            run_id:    run_id.clone(),
            markets:   inputs.markets.len(),
            cells:     inputs.cells.len(),
            distances: inputs.distances.len(),
        })?;
        log::info!(
            "{run_id}: {} markets, {} cells, {} distances",
            inputs.markets.len(),
            inputs.cells.len(),
            inputs.distances.len()
        );

        let runner = ScenarioRunner::new(&self.config.model, &self.config.basedata);
        let outcome = match runner.run(&inputs, sink, cancel) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_failure(&mut events, &run_id, &e)?;
                return Err(e);
            }
        };

        for scenario in [&outcome.status_quo, &outcome.planned] {
            events.append(&ImpactEvent::ScenarioComputed {
                scenario:  scenario.scenario,
                markets:   scenario.matrix.markets.len(),
                cells:     scenario.matrix.cells.len(),
                allocated: scenario.matrix.total(),
            })?;
        }

        if let Err(e) = self.store.replace_flow_results(&outcome.flows) {
            self.record_failure(&mut events, &run_id, &e)?;
            return Err(e);
        }
        events.append(&ImpactEvent::ResultsCommitted { rows: outcome.flows.len() })?;
        self.store.finish_run(&run_id, RunStatus::Succeeded, None)?;
        log::info!("{run_id}: committed {} flow rows", outcome.flows.len());

        Ok(summarize(run_id, &inputs.markets, &outcome))
    }

    fn record_failure(
        &self,
        events: &mut RunLog<'_>,
        run_id: &str,
        error: &ImpactError,
    ) -> ImpactResult<()> {
        let (event, status) = match error {
            ImpactError::Validation { markets } => (
                ImpactEvent::ValidationFailed { markets: markets.clone() },
                RunStatus::Failed,
            ),
            ImpactError::Cancelled { phase } => (
                ImpactEvent::RunCancelled { phase: phase.clone() },
                RunStatus::Cancelled,
            ),
            other => (
                ImpactEvent::RunFailed { reason: other.to_string() },
                RunStatus::Failed,
            ),
        };
        log::warn!("{run_id}: {error}");
        events.append(&event)?;
        self.store.finish_run(run_id, status, Some(&error.to_string()))
    }
}

fn summarize(run_id: RunId, markets: &[Market], outcome: &RunOutcome) -> RunSummary {
    RunSummary {
        run_id,
        flow_rows:            outcome.flows.len(),
        allocated_status_quo: outcome.status_quo.matrix.total(),
        allocated_planned:    outcome.planned.matrix.total(),
        market_sales:         market_sales(markets, &outcome.flows),
    }
}

/// Appends events for one run with increasing sequence numbers.
struct RunLog<'a> {
    store:  &'a ImpactStore,
    run_id: &'a str,
    seq:    u32,
}

impl<'a> RunLog<'a> {
    fn new(store: &'a ImpactStore, run_id: &'a str) -> Self {
        Self { store, run_id, seq: 0 }
    }

    fn append(&mut self, event: &ImpactEvent) -> ImpactResult<()> {
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.to_string(),
            seq:        self.seq,
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        self.store.append_event(&entry)?;
        self.seq += 1;
        Ok(())
    }
}
