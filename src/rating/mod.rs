//! Rating model and sequential updates
//!
//! This module provides the match outcome model, immutable rating snapshots,
//! and the engine that applies ordered fixture results to them.

pub mod calculator;
pub mod elo;
pub mod sequential;
pub mod store;

// Re-export commonly used types
pub use calculator::{EvenMatchModel, MatchDelta, MatchModel};
pub use elo::{EloMatchModel, EloParameters};
pub use sequential::{BatchOutcome, RatingUpdate, SequentialUpdater};
pub use store::{EntityInfo, RatingSnapshot, SnapshotBuilder};
