//! Rating store snapshots
//!
//! A [`RatingSnapshot`] is an immutable, versioned mapping from entity id to
//! rating. Updates never touch an existing snapshot: they go through a
//! [`SnapshotBuilder`] working copy that produces the next version.

use crate::error::{RankingError, Result};
use crate::types::{Entity, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Descriptive metadata for an entity, shared between snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub display_name: String,
    pub confederation: Option<String>,
}

/// Immutable rating mapping at one point in the update sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSnapshot {
    version: u64,
    ratings: BTreeMap<EntityId, f64>,
    #[serde(skip)]
    metadata: Arc<BTreeMap<EntityId, EntityInfo>>,
}

impl RatingSnapshot {
    /// Build the baseline snapshot (version 0) from entity records
    pub fn from_entities<I>(entities: I) -> Result<Self>
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut ratings = BTreeMap::new();
        let mut metadata = BTreeMap::new();

        for entity in entities {
            if !entity.rating.is_finite() {
                return Err(RankingError::InvalidRating {
                    entity_id: entity.id,
                    value: entity.rating,
                });
            }

            if ratings.contains_key(&entity.id) {
                return Err(RankingError::DuplicateEntity {
                    entity_id: entity.id,
                });
            }

            ratings.insert(entity.id.clone(), entity.rating);
            metadata.insert(
                entity.id,
                EntityInfo {
                    display_name: entity.display_name,
                    confederation: entity.confederation,
                },
            );
        }

        Ok(Self {
            version: 0,
            ratings,
            metadata: Arc::new(metadata),
        })
    }

    /// Logical version; each applied fixture advances it by one
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rating(&self, entity_id: &str) -> Option<f64> {
        self.ratings.get(entity_id).copied()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.ratings.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Ratings keyed by entity id, in id order
    pub fn ratings(&self) -> &BTreeMap<EntityId, f64> {
        &self.ratings
    }

    pub fn info(&self, entity_id: &str) -> Option<&EntityInfo> {
        self.metadata.get(entity_id)
    }

    /// Display name, falling back to the id
    pub fn display_name<'a>(&'a self, entity_id: &'a str) -> &'a str {
        self.metadata
            .get(entity_id)
            .map(|info| info.display_name.as_str())
            .unwrap_or(entity_id)
    }

    /// Reassemble full entity records for this snapshot
    pub fn entities(&self) -> Vec<Entity> {
        self.ratings
            .iter()
            .map(|(id, rating)| {
                let info = self.metadata.get(id);
                Entity {
                    id: id.clone(),
                    rating: *rating,
                    display_name: info
                        .map(|info| info.display_name.clone())
                        .unwrap_or_else(|| id.clone()),
                    confederation: info.and_then(|info| info.confederation.clone()),
                }
            })
            .collect()
    }

    /// Start a private working copy for producing the next snapshot
    pub fn to_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder {
            base_version: self.version,
            ratings: self.ratings.clone(),
            metadata: Arc::clone(&self.metadata),
            updates: 0,
        }
    }
}

/// Mutable working copy of a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    base_version: u64,
    ratings: BTreeMap<EntityId, f64>,
    metadata: Arc<BTreeMap<EntityId, EntityInfo>>,
    updates: u64,
}

impl SnapshotBuilder {
    pub fn rating(&self, entity_id: &str) -> Option<f64> {
        self.ratings.get(entity_id).copied()
    }

    /// Overwrite one rating; the entity must already exist
    pub fn set_rating(&mut self, entity_id: &str, rating: f64) -> Result<()> {
        if !rating.is_finite() {
            return Err(RankingError::InvalidRating {
                entity_id: entity_id.to_string(),
                value: rating,
            });
        }

        match self.ratings.get_mut(entity_id) {
            Some(slot) => {
                *slot = rating;
                Ok(())
            }
            None => Err(RankingError::EntityNotInPool {
                entity_id: entity_id.to_string(),
            }),
        }
    }

    /// Count one applied update towards the next version
    pub fn bump(&mut self) {
        self.updates += 1;
    }

    pub fn build(self) -> RatingSnapshot {
        RatingSnapshot {
            version: self.base_version + self.updates,
            ratings: self.ratings,
            metadata: self.metadata,
        }
    }
}
