//! Reference tables ("basedata") and model parameters.
//!
//! Production loads everything from the data/ directory; tests use
//! `ImpactConfig::default_test()` or build `BaseData` directly.

use crate::types::{Ags, ChainId, OutletTypeId, SizeClassId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance decay parameters for one (size class, chain, outlet type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttractionFactor {
    pub size_class:  SizeClassId,
    pub chain_id:    ChainId,
    pub outlet_type: OutletTypeId,
    pub exp_factor:  f64,
    pub exponent:    f64,
}

/// Clustering discount coefficients for one (chain, outlet type).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttractivityFactor {
    pub chain_id:    ChainId,
    pub outlet_type: OutletTypeId,
    pub one_near:    f64,
    pub two_near:    f64,
    pub three_near:  f64,
    pub second_with_gap:                    f64,
    pub third_with_gap_to_first:            f64,
    pub third_with_gap_to_first_and_second: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeClassBand {
    pub id:              SizeClassId,
    pub min_inhabitants: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub ags:         Ags,
    pub inhabitants: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunitySizes {
    pub classes:     Vec<SizeClassBand>,
    pub communities: Vec<Community>,
}

#[derive(Debug, Clone, Deserialize)]
struct AttractionFactorsFile {
    factors: Vec<AttractionFactor>,
}

#[derive(Debug, Clone, Deserialize)]
struct AttractivityFactorsFile {
    factors: Vec<AttractivityFactor>,
}

/// Reference tables keyed for lookup. Built once, read by every scenario.
#[derive(Debug, Clone, Default)]
pub struct BaseData {
    pub attraction:   HashMap<(SizeClassId, ChainId, OutletTypeId), AttractionFactor>,
    pub attractivity: HashMap<(ChainId, OutletTypeId), AttractivityFactor>,
    /// Sorted ascending by `min_inhabitants`.
    pub size_classes: Vec<SizeClassBand>,
    pub communities:  HashMap<Ags, i64>,
}

impl BaseData {
    pub fn new(
        attraction: Vec<AttractionFactor>,
        attractivity: Vec<AttractivityFactor>,
        community_sizes: CommunitySizes,
    ) -> Self {
        let mut size_classes = community_sizes.classes;
        size_classes.sort_by_key(|band| band.min_inhabitants);
        Self {
            attraction: attraction
                .into_iter()
                .map(|f| ((f.size_class, f.chain_id, f.outlet_type), f))
                .collect(),
            attractivity: attractivity
                .into_iter()
                .map(|f| ((f.chain_id, f.outlet_type), f))
                .collect(),
            size_classes,
            communities: community_sizes
                .communities
                .into_iter()
                .map(|c| (c.ags, c.inhabitants))
                .collect(),
        }
    }
}

/// Tunable parameters of the gravity model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Same-chain markets closer than this to the nearest one count as "near".
    #[serde(default = "default_cutoff_km")]
    pub cluster_cutoff_km: f64,
    /// Local providers serving each cell.
    #[serde(default = "default_local_provider_slots")]
    pub local_provider_slots: usize,
}

fn default_cutoff_km() -> f64 {
    1.0
}

fn default_local_provider_slots() -> usize {
    3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cluster_cutoff_km:    default_cutoff_km(),
            local_provider_slots: default_local_provider_slots(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImpactConfig {
    pub model:    ModelConfig,
    pub basedata: BaseData,
}

impl ImpactConfig {
    /// Load from the data/ directory.
    /// In tests, use ImpactConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let attraction_path = format!("{data_dir}/attraction_factors.json");
        let attraction_content = std::fs::read_to_string(&attraction_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {attraction_path}: {e}"))?;
        let attraction: AttractionFactorsFile = serde_json::from_str(&attraction_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {attraction_path}: {e}"))?;

        let attractivity_path = format!("{data_dir}/attractivity_factors.json");
        let attractivity_content = std::fs::read_to_string(&attractivity_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {attractivity_path}: {e}"))?;
        let attractivity: AttractivityFactorsFile = serde_json::from_str(&attractivity_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {attractivity_path}: {e}"))?;

        let sizes_path = format!("{data_dir}/community_sizes.json");
        let sizes_content = std::fs::read_to_string(&sizes_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {sizes_path}: {e}"))?;
        let community_sizes: CommunitySizes = serde_json::from_str(&sizes_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {sizes_path}: {e}"))?;

        // model.json is optional; every field has a default.
        let model_path = format!("{data_dir}/model.json");
        let model = match std::fs::read_to_string(&model_path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {model_path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ModelConfig::default(),
            Err(e) => return Err(anyhow::anyhow!("Cannot read {model_path}: {e}")),
        };

        log::debug!(
            "basedata loaded: {} attraction rows, {} attractivity rows, {} communities",
            attraction.factors.len(),
            attractivity.factors.len(),
            community_sizes.communities.len()
        );

        Ok(Self {
            model,
            basedata: BaseData::new(attraction.factors, attractivity.factors, community_sizes),
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    ///
    /// Size classes: 1 (< 5000 inhabitants), 2 (< 20000), 3 (rest).
    /// Communities "01001000" (3000), "01002000" (12000), "01003000" (80000).
    /// Generic (chain 0) rows exist for outlet types 1..=6 in every class.
    pub fn default_test() -> Self {
        let mut attraction = Vec::new();
        for size_class in 1..=3 {
            for outlet_type in 1..=6 {
                attraction.push(AttractionFactor {
                    size_class,
                    chain_id: 0,
                    outlet_type,
                    exp_factor: 1.0 + 0.1 * (outlet_type - 1) as f64,
                    exponent: -0.5 + 0.05 * (size_class - 1) as f64,
                });
            }
        }
        attraction.push(AttractionFactor {
            size_class:  2,
            chain_id:    7,
            outlet_type: 3,
            exp_factor:  1.8,
            exponent:    -0.4,
        });

        let mut attractivity = Vec::new();
        for outlet_type in 1..=6 {
            attractivity.push(AttractivityFactor {
                chain_id: 0,
                outlet_type,
                one_near:   1.0,
                two_near:   0.8,
                three_near: 0.6,
                second_with_gap:                    0.9,
                third_with_gap_to_first:            0.7,
                third_with_gap_to_first_and_second: 0.5,
            });
        }
        attractivity.push(AttractivityFactor {
            chain_id:    7,
            outlet_type: 3,
            one_near:    1.0,
            two_near:    0.75,
            three_near:  0.55,
            second_with_gap:                    0.85,
            third_with_gap_to_first:            0.65,
            third_with_gap_to_first_and_second: 0.45,
        });

        let community_sizes = CommunitySizes {
            classes: vec![
                SizeClassBand { id: 1, min_inhabitants: 0 },
                SizeClassBand { id: 2, min_inhabitants: 5_000 },
                SizeClassBand { id: 3, min_inhabitants: 20_000 },
            ],
            communities: vec![
                Community { ags: "01001000".into(), inhabitants: 3_000 },
                Community { ags: "01002000".into(), inhabitants: 12_000 },
                Community { ags: "01003000".into(), inhabitants: 80_000 },
            ],
        };

        Self {
            model:    ModelConfig::default(),
            basedata: BaseData::new(attraction, attractivity, community_sizes),
        }
    }
}
