//! Common types used throughout the rating engine

use crate::error::{RankingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable identifier for a competing team (e.g. a FIFA code)
pub type EntityId = String;

/// Unique identifier for a fixture
pub type FixtureId = String;

/// A competing national team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub rating: f64,
    pub display_name: String,
    /// Confederation the team plays in, used for pool filtering
    #[serde(default)]
    pub confederation: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, display_name: impl Into<String>, rating: f64) -> Self {
        Self {
            id: id.into(),
            rating,
            display_name: display_name.into(),
            confederation: None,
        }
    }

    pub fn with_confederation(mut self, confederation: impl Into<String>) -> Self {
        self.confederation = Some(confederation.into());
        self
    }
}

/// Competition a fixture belongs to; each class maps to an importance coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionClass {
    WorldCupQualifier,
    NationsLeague,
    Friendly,
    RegionalChampionship,
    FriendlyOutsideWindow,
    NationsLeagueFinals,
    WorldCupFinals,
}

impl CompetitionClass {
    /// Every class, in declaration order
    pub const ALL: [CompetitionClass; 7] = [
        CompetitionClass::WorldCupQualifier,
        CompetitionClass::NationsLeague,
        CompetitionClass::Friendly,
        CompetitionClass::RegionalChampionship,
        CompetitionClass::FriendlyOutsideWindow,
        CompetitionClass::NationsLeagueFinals,
        CompetitionClass::WorldCupFinals,
    ];
}

impl std::fmt::Display for CompetitionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompetitionClass::WorldCupQualifier => "world_cup_qualifier",
            CompetitionClass::NationsLeague => "nations_league",
            CompetitionClass::Friendly => "friendly",
            CompetitionClass::RegionalChampionship => "regional_championship",
            CompetitionClass::FriendlyOutsideWindow => "friendly_outside_window",
            CompetitionClass::NationsLeagueFinals => "nations_league_finals",
            CompetitionClass::WorldCupFinals => "world_cup_finals",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for CompetitionClass {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self> {
        CompetitionClass::ALL
            .iter()
            .find(|class| class.to_string() == s)
            .copied()
            .ok_or_else(|| RankingError::ConfigurationError {
                message: format!("Unknown competition class: {}", s),
            })
    }
}

/// Side of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Final score of a completed fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub home_goals: u32,
    pub away_goals: u32,
    /// Shoot-out winner of a drawn tie
    #[serde(default)]
    pub penalty_winner: Option<Side>,
}

impl MatchResult {
    pub fn new(home_goals: u32, away_goals: u32) -> Self {
        Self {
            home_goals,
            away_goals,
            penalty_winner: None,
        }
    }

    /// Drawn result decided on penalties
    pub fn on_penalties(goals: u32, winner: Side) -> Self {
        Self {
            home_goals: goals,
            away_goals: goals,
            penalty_winner: Some(winner),
        }
    }

    pub fn is_draw(&self) -> bool {
        self.home_goals == self.away_goals
    }

    /// Actual scores `(home, away)` fed into the outcome model.
    ///
    /// Win/draw/loss score 1, 0.5 and 0. A shoot-out winner scores 0.75 and
    /// the shoot-out loser keeps the 0.5 of a draw.
    pub fn actual_scores(&self) -> (f64, f64) {
        if self.home_goals > self.away_goals {
            (1.0, 0.0)
        } else if self.home_goals < self.away_goals {
            (0.0, 1.0)
        } else {
            match self.penalty_winner {
                Some(Side::Home) => (0.75, 0.5),
                Some(Side::Away) => (0.5, 0.75),
                None => (0.5, 0.5),
            }
        }
    }
}

/// A single match, scheduled or completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub date: NaiveDate,
    pub home_id: EntityId,
    pub away_id: EntityId,
    pub competition_class: CompetitionClass,
    /// Played at a neutral ground, so no home advantage applies
    #[serde(default)]
    pub neutral_venue: bool,
    /// Knockout tie: negative rating changes are not applied
    #[serde(default)]
    pub knockout: bool,
    #[serde(default)]
    pub result: Option<MatchResult>,
}

impl Fixture {
    /// Create a pending fixture
    pub fn scheduled(
        id: impl Into<FixtureId>,
        date: NaiveDate,
        home_id: impl Into<EntityId>,
        away_id: impl Into<EntityId>,
        competition_class: CompetitionClass,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            home_id: home_id.into(),
            away_id: away_id.into(),
            competition_class,
            neutral_venue: false,
            knockout: false,
            result: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }

    pub fn home_advantage_applies(&self) -> bool {
        !self.neutral_venue
    }

    /// Return a completed copy of this pending fixture.
    ///
    /// A fixture acquires its result exactly once; recording a second
    /// result is a data-integrity error.
    pub fn with_result(&self, result: MatchResult) -> Result<Fixture> {
        if self.result.is_some() {
            return Err(RankingError::ResultAlreadyRecorded {
                fixture_id: self.id.clone(),
            });
        }

        let mut completed = self.clone();
        completed.result = Some(result);
        completed.validate_shape()?;
        Ok(completed)
    }

    /// Check the fixture is internally consistent (ignores entity existence)
    pub fn validate_shape(&self) -> Result<()> {
        if self.home_id == self.away_id {
            return Err(RankingError::MalformedFixture {
                fixture_id: self.id.clone(),
                reason: format!("{} cannot play itself", self.home_id),
            });
        }

        if let Some(result) = &self.result {
            if result.penalty_winner.is_some() && !result.is_draw() {
                return Err(RankingError::MalformedFixture {
                    fixture_id: self.id.clone(),
                    reason: "penalty winner recorded on a decided match".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Rating change produced by applying one completed fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDelta {
    pub fixture_id: FixtureId,
    pub home_id: EntityId,
    pub away_id: EntityId,
    pub home_before: f64,
    pub away_before: f64,
    pub expected_home: f64,
    pub expected_away: f64,
    pub home_delta: f64,
    pub away_delta: f64,
    pub home_after: f64,
    pub away_after: f64,
}
