//! Rating engine configuration
//!
//! Every constant the outcome model and the scenario enumerator depend on
//! lives here, so behaviour is reproducible across environments.

use crate::error::{RankingError, Result};
use crate::projection::probability::DrawProbabilityRule;
use crate::types::CompetitionClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine configuration injected into every rating component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rating points added to the home side when computing expectations
    pub home_advantage_bonus: f64,
    /// Logistic scale constant of the expected-score curve
    pub elo_scale: f64,
    /// Importance coefficient (K) per competition class
    #[serde(with = "importance_map")]
    pub importance: BTreeMap<CompetitionClass, f64>,
    /// How win/draw/loss probabilities are derived from an expected score
    pub draw_probability_rule: DrawProbabilityRule,
    /// Largest scenario space evaluated exhaustively
    pub exhaustive_scenario_ceiling: u64,
    /// Seed for sampled enumeration; sampling refuses to run without one
    pub sampling_seed: Option<u64>,
    /// Number of scenarios drawn when sampling
    pub sample_count: u64,
    /// Decimal places deltas and ratings are rounded to
    pub rating_precision: u32,
    /// Worker threads used to evaluate scenarios
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home_advantage_bonus: 100.0,
            elo_scale: 400.0,
            importance: default_importance(),
            draw_probability_rule: DrawProbabilityRule::default(),
            exhaustive_scenario_ceiling: 1_000_000,
            sampling_seed: None,
            sample_count: 10_000,
            rating_precision: 2,
            workers: 1,
        }
    }
}

/// Default importance coefficients per competition class
pub fn default_importance() -> BTreeMap<CompetitionClass, f64> {
    CompetitionClass::ALL
        .iter()
        .map(|class| {
            let importance = match class {
                CompetitionClass::WorldCupQualifier => 25.0,
                CompetitionClass::NationsLeague => 15.0,
                CompetitionClass::Friendly => 10.0,
                CompetitionClass::RegionalChampionship => 20.0,
                CompetitionClass::FriendlyOutsideWindow => 5.0,
                CompetitionClass::NationsLeagueFinals => 25.0,
                CompetitionClass::WorldCupFinals => 50.0,
            };
            (*class, importance)
        })
        .collect()
}

impl EngineConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.home_advantage_bonus.is_finite() {
            return Err(RankingError::ConfigurationError {
                message: "Home advantage bonus must be finite".to_string(),
            });
        }

        if !self.elo_scale.is_finite() || self.elo_scale <= 0.0 {
            return Err(RankingError::ConfigurationError {
                message: "Elo scale must be positive".to_string(),
            });
        }

        for class in CompetitionClass::ALL {
            let k = self.importance_for(class)?;
            if !k.is_finite() || k < 0.0 {
                return Err(RankingError::ConfigurationError {
                    message: format!("Importance for {} must be non-negative", class),
                });
            }
        }

        self.draw_probability_rule.validate()?;

        if self.exhaustive_scenario_ceiling == 0 {
            return Err(RankingError::ConfigurationError {
                message: "Exhaustive scenario ceiling must be greater than 0".to_string(),
            });
        }

        if self.sample_count == 0 {
            return Err(RankingError::ConfigurationError {
                message: "Sample count must be greater than 0".to_string(),
            });
        }

        if self.rating_precision > 10 {
            return Err(RankingError::ConfigurationError {
                message: "Rating precision cannot exceed 10 decimal places".to_string(),
            });
        }

        if self.workers == 0 {
            return Err(RankingError::ConfigurationError {
                message: "At least one worker is required".to_string(),
            });
        }

        Ok(())
    }

    /// Importance coefficient for a competition class
    pub fn importance_for(&self, class: CompetitionClass) -> Result<f64> {
        self.importance
            .get(&class)
            .copied()
            .ok_or(RankingError::MissingImportance { class })
    }
}

/// (De)serialize the importance table with plain string keys so it reads
/// naturally from both TOML and JSON.
mod importance_map {
    use crate::types::CompetitionClass;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<CompetitionClass, f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        map.iter()
            .map(|(class, k)| (class.to_string(), *k))
            .collect::<BTreeMap<String, f64>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<CompetitionClass, f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(name, k)| {
                name.parse::<CompetitionClass>()
                    .map(|class| (class, k))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}
