//! Sequential update engine
//!
//! Applies an ordered batch of completed fixtures to a snapshot. Each fixture
//! reads the ratings left behind by the fixtures before it, so a batch is not
//! commutative when fixtures share a participant.

use crate::config::EngineConfig;
use crate::error::{RankingError, Result};
use crate::rating::calculator::{MatchDelta, MatchModel};
use crate::rating::elo::EloMatchModel;
use crate::rating::store::{RatingSnapshot, SnapshotBuilder};
use crate::types::{CompetitionClass, Fixture, FixtureDelta, MatchResult};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of applying a batch of fixtures
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub snapshot: RatingSnapshot,
    /// Per-fixture deltas, in application order
    pub deltas: Vec<FixtureDelta>,
}

/// Ratings around a single applied result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub home_before: f64,
    pub away_before: f64,
    pub delta: MatchDelta,
    pub home_after: f64,
    pub away_after: f64,
}

/// Applies chronologically ordered fixture results to rating snapshots
#[derive(Debug, Clone)]
pub struct SequentialUpdater<M: MatchModel> {
    model: M,
    importance: BTreeMap<CompetitionClass, f64>,
}

impl SequentialUpdater<EloMatchModel> {
    /// Build an Elo-backed updater from engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let importance = CompetitionClass::ALL
            .into_iter()
            .map(|class| Ok((class, config.importance_for(class)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Self::new(EloMatchModel::from_config(config)?, importance)
    }
}

impl<M: MatchModel> SequentialUpdater<M> {
    /// Create an updater; every competition class needs a coefficient
    pub fn new(model: M, importance: BTreeMap<CompetitionClass, f64>) -> Result<Self> {
        for class in CompetitionClass::ALL {
            if !importance.contains_key(&class) {
                return Err(RankingError::MissingImportance { class });
            }
        }

        Ok(Self { model, importance })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Importance coefficient for a competition class
    pub fn importance(&self, class: CompetitionClass) -> Result<f64> {
        self.importance
            .get(&class)
            .copied()
            .ok_or(RankingError::MissingImportance { class })
    }

    /// Apply an ordered batch and return the new snapshot with its deltas.
    ///
    /// The batch is checked in full before anything is applied; any invalid
    /// fixture rejects the whole batch and no snapshot is produced.
    pub fn apply(&self, snapshot: &RatingSnapshot, fixtures: &[Fixture]) -> Result<BatchOutcome> {
        for fixture in fixtures {
            self.check_fixture(snapshot, fixture)?;
        }

        let mut working = snapshot.to_builder();
        let mut deltas = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            deltas.push(self.apply_fixture(&mut working, fixture)?);
        }

        Ok(BatchOutcome {
            snapshot: working.build(),
            deltas,
        })
    }

    /// Validate one fixture against a snapshot without applying it
    pub fn check_fixture(&self, snapshot: &RatingSnapshot, fixture: &Fixture) -> Result<()> {
        fixture.validate_shape()?;

        if fixture.result.is_none() {
            return Err(RankingError::MissingResult {
                fixture_id: fixture.id.clone(),
            });
        }

        self.check_participants(snapshot, fixture)?;
        self.importance(fixture.competition_class)?;
        Ok(())
    }

    /// Ensure both participants exist in the snapshot
    pub fn check_participants(&self, snapshot: &RatingSnapshot, fixture: &Fixture) -> Result<()> {
        for entity_id in [&fixture.home_id, &fixture.away_id] {
            if !snapshot.contains(entity_id) {
                return Err(RankingError::UnknownEntity {
                    fixture_id: fixture.id.clone(),
                    entity_id: entity_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Apply one completed fixture to a working copy
    pub fn apply_fixture(
        &self,
        working: &mut SnapshotBuilder,
        fixture: &Fixture,
    ) -> Result<FixtureDelta> {
        let result = fixture
            .result
            .as_ref()
            .ok_or_else(|| RankingError::MissingResult {
                fixture_id: fixture.id.clone(),
            })?;

        let update = self.apply_result(working, fixture, result)?;

        debug!(
            "Fixture {}: {} {:+.2} -> {:.2}, {} {:+.2} -> {:.2}",
            fixture.id,
            fixture.home_id,
            update.delta.home_delta,
            update.home_after,
            fixture.away_id,
            update.delta.away_delta,
            update.away_after
        );

        Ok(FixtureDelta {
            fixture_id: fixture.id.clone(),
            home_id: fixture.home_id.clone(),
            away_id: fixture.away_id.clone(),
            home_before: update.home_before,
            away_before: update.away_before,
            expected_home: update.delta.expected_home,
            expected_away: update.delta.expected_away,
            home_delta: update.delta.home_delta,
            away_delta: update.delta.away_delta,
            home_after: update.home_after,
            away_after: update.away_after,
        })
    }

    /// Apply `result` as the outcome of `fixture` to a working copy.
    ///
    /// The fixture's own result is ignored, which lets hypothetical outcomes
    /// run through the same update path without completing the fixture.
    pub fn apply_result(
        &self,
        working: &mut SnapshotBuilder,
        fixture: &Fixture,
        result: &MatchResult,
    ) -> Result<RatingUpdate> {
        let home_before = self.current_rating(working, fixture, &fixture.home_id)?;
        let away_before = self.current_rating(working, fixture, &fixture.away_id)?;
        let importance = self.importance(fixture.competition_class)?;

        let mut delta = self.model.rating_deltas(
            home_before,
            away_before,
            fixture.home_advantage_applies(),
            importance,
            result.actual_scores(),
        );
        if fixture.knockout {
            delta = delta.protect_losses();
        }

        // Deltas are already rounded; ratings move by exactly that much
        let home_after = home_before + delta.home_delta;
        let away_after = away_before + delta.away_delta;

        working.set_rating(&fixture.home_id, home_after)?;
        working.set_rating(&fixture.away_id, away_after)?;
        working.bump();

        Ok(RatingUpdate {
            home_before,
            away_before,
            delta,
            home_after,
            away_after,
        })
    }

    fn current_rating(
        &self,
        working: &SnapshotBuilder,
        fixture: &Fixture,
        entity_id: &str,
    ) -> Result<f64> {
        working
            .rating(entity_id)
            .ok_or_else(|| RankingError::UnknownEntity {
                fixture_id: fixture.id.clone(),
                entity_id: entity_id.to_string(),
            })
    }
}
