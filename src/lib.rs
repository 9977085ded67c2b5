//! Scenario Ranker - Elo rating engine with fixture scenario projection
//!
//! This crate rates national teams with an Elo-style model, applies
//! completed fixtures in chronological order, and projects how a focal
//! team's rank can move over the outcomes of pending fixtures.

pub mod config;
pub mod dataset;
pub mod error;
pub mod projection;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{ErrorKind, RankingError, Result};
pub use types::*;

// Re-export key components
pub use dataset::Dataset;
pub use projection::{PendingFixture, Projection, ProjectionRequest, RankProjector, ScenarioEnumerator};
pub use rating::{EloMatchModel, MatchModel, RatingSnapshot, SequentialUpdater};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
