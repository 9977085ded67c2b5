//! Configuration management for the scenario-ranker
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for the rating engine.

pub mod app;
pub mod engine;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use engine::{default_importance, EngineConfig};
