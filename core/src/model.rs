//! Input records supplied by the surrounding planning tool.
//!
//! The core never mutates these. Each scenario run takes a read-only
//! view and produces flow results of its own.

use crate::types::{
    Ags, CellId, ChainId, MarketId, OutletTypeId, NO_CHAIN, OUTLET_CLOSED,
    OUTLET_LOCAL_PROVIDER, OUTLET_SMALL_MARKET,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id:                 MarketId,
    pub name:               String,
    pub ags:                Ags,
    pub chain_id:           ChainId,
    pub outlet_status_quo:  OutletTypeId,
    pub outlet_planned:     OutletTypeId,
    #[serde(default)]
    pub sales_area:         f64,
}

impl Market {
    /// Outlet type of this market in the given scenario.
    pub fn outlet_type(&self, scenario: Scenario) -> OutletTypeId {
        match scenario {
            Scenario::StatusQuo => self.outlet_status_quo,
            Scenario::Planned   => self.outlet_planned,
        }
    }

    pub fn exists_in(&self, scenario: Scenario) -> bool {
        self.outlet_type(scenario) != OUTLET_CLOSED
    }

    /// A market that only exists once the plan is realised.
    pub fn is_planned(&self) -> bool {
        self.outlet_status_quo == OUTLET_CLOSED && self.outlet_planned != OUTLET_CLOSED
    }

    pub fn has_chain(&self) -> bool {
        self.chain_id != NO_CHAIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id:                CellId,
    pub purchasing_power:  f64,
    /// Planned area this cell belongs to. `None` or a negative id marks an
    /// existing settlement cell.
    #[serde(default)]
    pub planned_area_id:   Option<i64>,
    pub ags:               Ags,
    #[serde(default)]
    pub inhabitants:       f64,
}

impl Cell {
    /// Purchasing power of a cell from its population, the per-capita
    /// retail spending and the regional purchasing power index (100 = average).
    pub fn purchasing_power_from(
        inhabitants: f64,
        per_capita_spending: f64,
        regional_index: f64,
    ) -> f64 {
        inhabitants * per_capita_spending * regional_index / 100.0
    }

    pub fn is_in_planned_area(&self) -> bool {
        matches!(self.planned_area_id, Some(id) if id >= 0)
    }
}

/// One row of the precomputed distance table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub market_id: MarketId,
    pub cell_id:   CellId,
    /// Routed distance in meters, -1 if unreachable.
    pub routed_m:  f64,
    pub beeline_m: f64,
}

/// The two compared worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Nullfall: without the proposed development.
    StatusQuo,
    /// Planfall: with the proposed development.
    Planned,
}

impl Scenario {
    pub fn label(self) -> &'static str {
        match self {
            Scenario::StatusQuo => "status quo",
            Scenario::Planned   => "planned",
        }
    }
}

/// Competition tier of an outlet type. Markets only compete within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutletTier {
    LocalProvider,
    SmallMarket,
    LargeFormat,
}

impl OutletTier {
    /// `None` for closed outlets.
    pub fn of(outlet_type: OutletTypeId) -> Option<Self> {
        match outlet_type {
            t if t == OUTLET_CLOSED => None,
            t if t == OUTLET_LOCAL_PROVIDER => Some(OutletTier::LocalProvider),
            t if t == OUTLET_SMALL_MARKET => Some(OutletTier::SmallMarket),
            t if t > OUTLET_SMALL_MARKET => Some(OutletTier::LargeFormat),
            _ => None,
        }
    }
}

/// Everything a scenario run reads, bundled for dependency injection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInputs {
    pub markets:   Vec<Market>,
    pub cells:     Vec<Cell>,
    pub distances: Vec<DistanceRecord>,
}
