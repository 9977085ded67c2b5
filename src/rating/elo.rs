//! Elo match outcome model
//!
//! Concrete [`MatchModel`] built on the logistic expected-score curve from the
//! skillratings crate, extended with a home-advantage bonus and a
//! configurable scale constant.

use crate::config::EngineConfig;
use crate::error::{RankingError, Result};
use crate::rating::calculator::MatchModel;
use serde::{Deserialize, Serialize};
use skillratings::elo::{expected_score, EloRating};

/// Parameters of the Elo outcome model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloParameters {
    /// Rating points added to the home side's effective rating
    pub home_advantage_bonus: f64,
    /// Logistic scale constant (400 in classic Elo)
    pub scale: f64,
    /// Decimal places deltas are rounded to
    pub precision: u32,
}

impl Default for EloParameters {
    fn default() -> Self {
        Self {
            home_advantage_bonus: 100.0,
            scale: 400.0,
            precision: 2,
        }
    }
}

impl EloParameters {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RankingError::ConfigurationError {
                message: "Elo scale must be positive".to_string(),
            });
        }

        if !self.home_advantage_bonus.is_finite() {
            return Err(RankingError::ConfigurationError {
                message: "Home advantage bonus must be finite".to_string(),
            });
        }

        Ok(())
    }
}

/// Elo match outcome model
#[derive(Debug, Clone)]
pub struct EloMatchModel {
    params: EloParameters,
}

impl EloMatchModel {
    /// Create a new Elo model
    pub fn new(params: EloParameters) -> Result<Self> {
        params.validate()?;

        Ok(Self { params })
    }

    /// Build the model from engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(EloParameters {
            home_advantage_bonus: config.home_advantage_bonus,
            scale: config.elo_scale,
            precision: config.rating_precision,
        })
    }

    pub fn params(&self) -> &EloParameters {
        &self.params
    }
}

impl MatchModel for EloMatchModel {
    fn expected_home(&self, home_rating: f64, away_rating: f64, home_advantage: bool) -> f64 {
        let bonus = if home_advantage {
            self.params.home_advantage_bonus
        } else {
            0.0
        };

        // skillratings fixes the scale at 400; rescale the ratings so the
        // difference is measured against our configured scale instead.
        let factor = 400.0 / self.params.scale;
        let home = EloRating {
            rating: (home_rating + bonus) * factor,
        };
        let away = EloRating {
            rating: away_rating * factor,
        };

        let (expected_home, _expected_away) = expected_score(&home, &away);
        expected_home
    }

    fn precision(&self) -> u32 {
        self.params.precision
    }
}
