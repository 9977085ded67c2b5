//! Error types for the rating engine
//!
//! Engine operations return a typed [`RankingError`]; application code
//! (config loading, dataset files, the CLI) wraps these in `anyhow`.

use crate::types::{CompetitionClass, EntityId, FixtureId};

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RankingError>;

/// Broad category of a [`RankingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input records are inconsistent; the whole batch is rejected
    DataIntegrity,
    /// Engine configuration is unusable; rejected before evaluation
    Configuration,
    /// A lookup targeted an entity outside the ranked pool
    NotFound,
}

/// Custom error types for rating and projection failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("Fixture {fixture_id} references unknown entity {entity_id}")]
    UnknownEntity {
        fixture_id: FixtureId,
        entity_id: EntityId,
    },

    #[error("Fixture {fixture_id} is malformed: {reason}")]
    MalformedFixture { fixture_id: FixtureId, reason: String },

    #[error("Unknown fixture: {fixture_id}")]
    UnknownFixture { fixture_id: FixtureId },

    #[error("Fixture {fixture_id} has no result")]
    MissingResult { fixture_id: FixtureId },

    #[error("Fixture {fixture_id} already has a result")]
    ResultAlreadyRecorded { fixture_id: FixtureId },

    #[error("Duplicate entity id: {entity_id}")]
    DuplicateEntity { entity_id: EntityId },

    #[error("Invalid rating for entity {entity_id}: {value}")]
    InvalidRating { entity_id: EntityId, value: f64 },

    #[error("Entity not found in pool: {entity_id}")]
    EntityNotInPool { entity_id: EntityId },

    #[error("No importance coefficient configured for {class}")]
    MissingImportance { class: CompetitionClass },

    #[error("Invalid draw probability rule: {reason}")]
    InvalidDrawRule { reason: String },

    #[error("Sampling requires an explicit seed")]
    MissingSeed,

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RankingError {
    /// Classify the error for callers that branch on failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            RankingError::UnknownEntity { .. }
            | RankingError::MalformedFixture { .. }
            | RankingError::UnknownFixture { .. }
            | RankingError::MissingResult { .. }
            | RankingError::ResultAlreadyRecorded { .. }
            | RankingError::DuplicateEntity { .. }
            | RankingError::InvalidRating { .. } => ErrorKind::DataIntegrity,
            RankingError::EntityNotInPool { .. } => ErrorKind::NotFound,
            RankingError::MissingImportance { .. }
            | RankingError::InvalidDrawRule { .. }
            | RankingError::MissingSeed
            | RankingError::ConfigurationError { .. } => ErrorKind::Configuration,
        }
    }
}
