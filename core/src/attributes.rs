//! Per-market multipliers resolved from the reference tables.
//!
//! Lookup order for both factor tables: the exact chain row first, then the
//! generic chain 0 row. A miss on both is a basedata integrity problem.

use crate::{
    config::{AttractivityFactor, BaseData},
    error::{ImpactError, ImpactResult},
    model::{Market, OutletTier, Scenario},
    types::{ChainId, MarketId, OutletTypeId, SizeClassId, NO_CHAIN},
};

/// Everything the allocator needs to know about one market in one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketProfile {
    pub market_id:    MarketId,
    pub chain_id:     ChainId,
    pub outlet_type:  OutletTypeId,
    pub tier:         OutletTier,
    pub size_class:   SizeClassId,
    pub exp_factor:   f64,
    pub exponent:     f64,
    pub attractivity: AttractivityFactor,
}

impl MarketProfile {
    /// `Ok(None)` if the market does not exist in `scenario`.
    pub fn resolve(
        market: &Market,
        scenario: Scenario,
        basedata: &BaseData,
    ) -> ImpactResult<Option<Self>> {
        let outlet_type = market.outlet_type(scenario);
        let Some(tier) = OutletTier::of(outlet_type) else {
            return Ok(None);
        };
        let size_class = size_class_of(basedata, &market.ags)?;
        let (exp_factor, exponent) =
            attraction_params(basedata, size_class, market.chain_id, outlet_type)?;
        let attractivity = attractivity_coefficients(basedata, market.chain_id, outlet_type)?;
        Ok(Some(Self {
            market_id: market.id,
            chain_id: market.chain_id,
            outlet_type,
            tier,
            size_class,
            exp_factor,
            exponent,
            attractivity,
        }))
    }

    /// Undiscounted attraction at `distance_km`.
    pub fn raw_attraction(&self, distance_km: f64) -> f64 {
        self.exp_factor * (self.exponent * distance_km).exp()
    }
}

/// Size class of the community with key `ags`.
pub fn size_class_of(basedata: &BaseData, ags: &str) -> ImpactResult<SizeClassId> {
    let inhabitants = *basedata
        .communities
        .get(ags)
        .ok_or_else(|| ImpactError::CommunityMissing { ags: ags.to_string() })?;
    basedata
        .size_classes
        .iter()
        .rev()
        .find(|band| band.min_inhabitants <= inhabitants)
        .map(|band| band.id)
        .ok_or(ImpactError::SizeClassMissing { inhabitants })
}

/// `(exp_factor, exponent)` for a market.
pub fn attraction_params(
    basedata: &BaseData,
    size_class: SizeClassId,
    chain_id: ChainId,
    outlet_type: OutletTypeId,
) -> ImpactResult<(f64, f64)> {
    basedata
        .attraction
        .get(&(size_class, chain_id, outlet_type))
        .or_else(|| basedata.attraction.get(&(size_class, NO_CHAIN, outlet_type)))
        .map(|row| (row.exp_factor, row.exponent))
        .ok_or(ImpactError::AttractionFactorMissing {
            size_class,
            chain: chain_id,
            outlet_type,
        })
}

pub fn attractivity_coefficients(
    basedata: &BaseData,
    chain_id: ChainId,
    outlet_type: OutletTypeId,
) -> ImpactResult<AttractivityFactor> {
    basedata
        .attractivity
        .get(&(chain_id, outlet_type))
        .or_else(|| basedata.attractivity.get(&(NO_CHAIN, outlet_type)))
        .copied()
        .ok_or(ImpactError::AttractivityFactorMissing {
            chain: chain_id,
            outlet_type,
        })
}
