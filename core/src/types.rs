//! Shared primitive types used across the entire model.

/// Identifier of a market (existing or planned).
pub type MarketId = i64;

/// Identifier of a settlement cell.
pub type CellId = i64;

/// Retail chain identifier. 0 means "no chain" (or "unset" for planned markets).
pub type ChainId = i64;

/// Outlet type identifier. 0 means the market does not exist in a scenario.
pub type OutletTypeId = i64;

/// Community size class identifier.
pub type SizeClassId = i64;

/// Official community key (Amtlicher Gemeindeschluessel).
pub type Ags = String;

/// The canonical run identifier.
pub type RunId = String;

/// Chain id meaning "no chain". Also the fallback row in reference tables.
pub const NO_CHAIN: ChainId = 0;

/// Outlet type meaning "closed / not present".
pub const OUTLET_CLOSED: OutletTypeId = 0;

/// Outlet type of local providers.
pub const OUTLET_LOCAL_PROVIDER: OutletTypeId = 1;

/// Outlet type of small markets. Everything above is a larger format.
pub const OUTLET_SMALL_MARKET: OutletTypeId = 2;

/// Routed distance value marking an unreachable market-cell pair.
pub const UNREACHABLE: f64 = -1.0;
