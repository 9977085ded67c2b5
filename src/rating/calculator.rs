//! Match outcome model trait
//!
//! This module defines the interface the update engine and the scenario
//! enumerator use to turn two ratings and a result into rating deltas.

use crate::utils::round_to;
use serde::{Deserialize, Serialize};

/// Expected scores and rating deltas for a single fixture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDelta {
    pub expected_home: f64,
    pub expected_away: f64,
    pub home_delta: f64,
    pub away_delta: f64,
}

impl MatchDelta {
    /// Drop negative deltas; knockout ties never cost a side points
    pub fn protect_losses(self) -> Self {
        Self {
            home_delta: self.home_delta.max(0.0),
            away_delta: self.away_delta.max(0.0),
            ..self
        }
    }
}

/// Trait for computing expected outcomes and rating deltas
pub trait MatchModel: Send + Sync {
    /// Expected score of the home side, in `[0, 1]`
    ///
    /// # Arguments
    /// * `home_rating` - current rating of the home side
    /// * `away_rating` - current rating of the away side
    /// * `home_advantage` - whether the home bonus applies to this fixture
    fn expected_home(&self, home_rating: f64, away_rating: f64, home_advantage: bool) -> f64;

    /// Decimal places deltas are rounded to before being applied
    fn precision(&self) -> u32;

    /// Rating deltas for both sides given the actual `(home, away)` scores
    fn rating_deltas(
        &self,
        home_rating: f64,
        away_rating: f64,
        home_advantage: bool,
        importance: f64,
        actual: (f64, f64),
    ) -> MatchDelta {
        let expected_home = self.expected_home(home_rating, away_rating, home_advantage);
        let expected_away = 1.0 - expected_home;
        let (actual_home, actual_away) = actual;

        MatchDelta {
            expected_home,
            expected_away,
            home_delta: round_to(importance * (actual_home - expected_home), self.precision()),
            away_delta: round_to(importance * (actual_away - expected_away), self.precision()),
        }
    }
}

/// Model that treats every fixture as a coin flip, for testing
#[derive(Debug, Clone, Default)]
pub struct EvenMatchModel;

impl MatchModel for EvenMatchModel {
    fn expected_home(&self, _home_rating: f64, _away_rating: f64, _home_advantage: bool) -> f64 {
        0.5
    }

    fn precision(&self) -> u32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_model_deltas() {
        let model = EvenMatchModel;
        let delta = model.rating_deltas(1800.0, 1200.0, true, 20.0, (1.0, 0.0));

        assert_eq!(delta.expected_home, 0.5);
        assert_eq!(delta.expected_away, 0.5);
        assert_eq!(delta.home_delta, 10.0);
        assert_eq!(delta.away_delta, -10.0);
    }

    #[test]
    fn test_protect_losses() {
        let delta = MatchDelta {
            expected_home: 0.7,
            expected_away: 0.3,
            home_delta: -17.5,
            away_delta: 17.5,
        }
        .protect_losses();

        assert_eq!(delta.home_delta, 0.0);
        assert_eq!(delta.away_delta, 17.5);
        assert_eq!(delta.expected_home, 0.7);
    }
}
