//! Main application configuration
//!
//! This module defines the top-level configuration for the scenario-ranker
//! binary, including TOML/environment loading and validation.

use crate::config::engine::EngineConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub engine: EngineConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "scenario-ranker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Invalid TOML in config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Engine settings
        if let Ok(bonus) = env::var("HOME_ADVANTAGE_BONUS") {
            self.engine.home_advantage_bonus = bonus
                .parse()
                .map_err(|_| anyhow!("Invalid HOME_ADVANTAGE_BONUS value: {}", bonus))?;
        }
        if let Ok(scale) = env::var("ELO_SCALE") {
            self.engine.elo_scale = scale
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_SCALE value: {}", scale))?;
        }
        if let Ok(ceiling) = env::var("EXHAUSTIVE_SCENARIO_CEILING") {
            self.engine.exhaustive_scenario_ceiling = ceiling
                .parse()
                .map_err(|_| anyhow!("Invalid EXHAUSTIVE_SCENARIO_CEILING value: {}", ceiling))?;
        }
        if let Ok(seed) = env::var("SAMPLING_SEED") {
            self.engine.sampling_seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid SAMPLING_SEED value: {}", seed))?,
            );
        }
        if let Ok(samples) = env::var("SAMPLE_COUNT") {
            self.engine.sample_count = samples
                .parse()
                .map_err(|_| anyhow!("Invalid SAMPLE_COUNT value: {}", samples))?;
        }
        if let Ok(workers) = env::var("SCENARIO_WORKERS") {
            self.engine.workers = workers
                .parse()
                .map_err(|_| anyhow!("Invalid SCENARIO_WORKERS value: {}", workers))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.engine.validate()?;

    Ok(())
}
