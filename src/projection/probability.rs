//! Outcome probabilities for pending fixtures
//!
//! The expected-score curve only describes a binary win/loss split, so the
//! probability of a draw has to come from an explicit policy.

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};

/// Policy for turning an expected home score into win/draw/loss probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DrawProbabilityRule {
    /// A constant draw probability; the remaining mass is split between
    /// home and away win in proportion to the expected scores.
    FixedFraction { draw: f64 },
    /// Draw probability peaks at `max_draw` for an even match and falls
    /// linearly to zero as the expected home score approaches 0 or 1.
    ClosenessScaled { max_draw: f64 },
    /// Every outcome is equally likely regardless of ratings
    Uniform,
}

impl Default for DrawProbabilityRule {
    fn default() -> Self {
        DrawProbabilityRule::FixedFraction { draw: 0.25 }
    }
}

/// Probability of each result class for one fixture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl OutcomeProbabilities {
    pub fn total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }
}

impl DrawProbabilityRule {
    /// Validate policy parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            DrawProbabilityRule::FixedFraction { draw } => {
                if !draw.is_finite() || *draw <= 0.0 || *draw >= 1.0 {
                    return Err(RankingError::InvalidDrawRule {
                        reason: format!("draw fraction must be in (0, 1), got {}", draw),
                    });
                }
            }
            DrawProbabilityRule::ClosenessScaled { max_draw } => {
                if !max_draw.is_finite() || *max_draw <= 0.0 || *max_draw >= 1.0 {
                    return Err(RankingError::InvalidDrawRule {
                        reason: format!("max draw must be in (0, 1), got {}", max_draw),
                    });
                }
            }
            DrawProbabilityRule::Uniform => {}
        }

        Ok(())
    }

    /// Split an expected home score into outcome probabilities summing to 1
    pub fn split(&self, expected_home: f64) -> OutcomeProbabilities {
        let draw = match self {
            DrawProbabilityRule::FixedFraction { draw } => *draw,
            DrawProbabilityRule::ClosenessScaled { max_draw } => {
                max_draw * (1.0 - (2.0 * expected_home - 1.0).abs())
            }
            DrawProbabilityRule::Uniform => {
                return OutcomeProbabilities {
                    home_win: 1.0 / 3.0,
                    draw: 1.0 / 3.0,
                    away_win: 1.0 / 3.0,
                }
            }
        };

        OutcomeProbabilities {
            home_win: expected_home * (1.0 - draw),
            draw,
            away_win: (1.0 - expected_home) * (1.0 - draw),
        }
    }
}
