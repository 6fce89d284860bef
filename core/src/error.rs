use crate::types::{Ags, ChainId, OutletTypeId, SizeClassId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImpactError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Planned markets without a defined provider. Blocks the run.
    #[error("Planned markets without a defined chain: {}", markets.join(", "))]
    Validation { markets: Vec<String> },

    #[error("No attraction factor for size class {size_class}, chain {chain}, outlet type {outlet_type} (chain 0 fallback missing too)")]
    AttractionFactorMissing {
        size_class:  SizeClassId,
        chain:       ChainId,
        outlet_type: OutletTypeId,
    },

    #[error("No attractivity factor for chain {chain}, outlet type {outlet_type} (chain 0 fallback missing too)")]
    AttractivityFactorMissing {
        chain:       ChainId,
        outlet_type: OutletTypeId,
    },

    #[error("Community '{ags}' not found in community size table")]
    CommunityMissing { ags: Ags },

    #[error("No size class covers {inhabitants} inhabitants")]
    SizeClassMissing { inhabitants: i64 },

    #[error("Run cancelled during {phase}")]
    Cancelled { phase: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImpactError {
    /// True for errors the caller can fix by correcting the inputs.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, ImpactError::Validation { .. })
    }
}

pub type ImpactResult<T> = Result<T, ImpactError>;
