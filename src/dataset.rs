//! Entity and fixture records at the input boundary
//!
//! Records are validated once when a dataset is loaded, so the engine can
//! trust the ids it is handed.

use crate::error::{RankingError, Result};
use crate::rating::store::RatingSnapshot;
use crate::types::{Entity, Fixture, MatchResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Entities plus the fixture registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
}

impl Dataset {
    /// Build a dataset from in-memory records
    pub fn new(entities: Vec<Entity>, fixtures: Vec<Fixture>) -> Result<Self> {
        let mut dataset = Self { entities, fixtures };
        dataset.validate()?;
        dataset.sort_fixtures();
        Ok(dataset)
    }

    /// Load and validate a dataset from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {:?}", path))?;
        let dataset = Self::from_json_str(&content)
            .with_context(|| format!("Invalid dataset file: {:?}", path))?;

        info!(
            "Loaded {} entities and {} fixtures from {:?}",
            dataset.entities.len(),
            dataset.fixtures.len(),
            path
        );
        Ok(dataset)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let raw: Dataset = serde_json::from_str(content).context("Failed to parse dataset JSON")?;
        Ok(Self::new(raw.entities, raw.fixtures)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize dataset")
    }

    /// Check entity and fixture records for consistency
    pub fn validate(&self) -> Result<()> {
        let snapshot = self.baseline()?;

        let mut seen = BTreeSet::new();
        for fixture in &self.fixtures {
            if !seen.insert(fixture.id.as_str()) {
                return Err(RankingError::MalformedFixture {
                    fixture_id: fixture.id.clone(),
                    reason: "duplicate fixture id".to_string(),
                });
            }

            fixture.validate_shape()?;

            for entity_id in [&fixture.home_id, &fixture.away_id] {
                if !snapshot.contains(entity_id) {
                    return Err(RankingError::UnknownEntity {
                        fixture_id: fixture.id.clone(),
                        entity_id: entity_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Baseline snapshot built from the entity records
    pub fn baseline(&self) -> Result<RatingSnapshot> {
        RatingSnapshot::from_entities(self.entities.iter().cloned())
    }

    /// Completed fixtures in chronological order
    pub fn completed(&self) -> Vec<Fixture> {
        self.fixtures
            .iter()
            .filter(|f| f.is_completed())
            .cloned()
            .collect()
    }

    /// Pending fixtures in chronological order
    pub fn pending(&self) -> Vec<Fixture> {
        self.fixtures
            .iter()
            .filter(|f| !f.is_completed())
            .cloned()
            .collect()
    }

    /// Record the result of a pending fixture; a fixture takes a result once
    pub fn record_result(&mut self, fixture_id: &str, result: MatchResult) -> Result<()> {
        let fixture = self
            .fixtures
            .iter_mut()
            .find(|f| f.id == fixture_id)
            .ok_or_else(|| RankingError::UnknownFixture {
                fixture_id: fixture_id.to_string(),
            })?;

        *fixture = fixture.with_result(result)?;
        Ok(())
    }

    fn sort_fixtures(&mut self) {
        self.fixtures
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    }
}
