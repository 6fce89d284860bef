//! Run events.
//!
//! Every run appends its lifecycle to `event_log`, in emission order.
//! Variants are only ever added, never removed or reordered.

use crate::{model::Scenario, types::RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImpactEvent {
    RunStarted {
        run_id:    RunId,
        markets:   usize,
        cells:     usize,
        distances: usize,
    },
    ValidationFailed {
        markets: Vec<String>,
    },
    ScenarioComputed {
        scenario:  Scenario,
        markets:   usize,
        cells:     usize,
        allocated: f64,
    },
    ResultsCommitted {
        rows: usize,
    },
    RunCancelled {
        phase: String,
    },
    RunFailed {
        reason: String,
    },
}

impl ImpactEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            ImpactEvent::RunStarted { .. }       => "run_started",
            ImpactEvent::ValidationFailed { .. } => "validation_failed",
            ImpactEvent::ScenarioComputed { .. } => "scenario_computed",
            ImpactEvent::ResultsCommitted { .. } => "results_committed",
            ImpactEvent::RunCancelled { .. }     => "run_cancelled",
            ImpactEvent::RunFailed { .. }        => "run_failed",
        }
    }
}

/// A persisted event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u32,
    pub event_type: String,
    pub payload:    String,
}
