//! Arena Configuration
//!
//! Tunables for a match. Loaded from a JSON file, optionally overridden
//! from the environment, and validated before the simulation starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TICK_RATE;

/// Fraction of `S` cells that receive a soft wall.
pub const DEFAULT_SOFT_WALL_RATE: f64 = 0.825;

/// Chance that a burnt soft wall leaves a pickup.
pub const DEFAULT_PICKUP_DROP_RATE: f64 = 0.5;

/// Most ticks a single clock advance may run.
pub const DEFAULT_MAX_CATCH_UP_TICKS: u32 = 5;

/// Match configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seed for soft wall placement and pickup drops
    pub seed: u64,
    /// Simulation rate (Hz)
    pub tick_rate: u32,
    /// Probability that an `S` cell gets a wall
    pub soft_wall_rate: f64,
    /// Probability that a burnt soft wall drops a pickup
    pub pickup_drop_rate: f64,
    /// Catch-up cap for the simulation clock
    pub max_catch_up_ticks: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_B0B0,
            tick_rate: TICK_RATE,
            soft_wall_rate: DEFAULT_SOFT_WALL_RATE,
            pickup_drop_rate: DEFAULT_PICKUP_DROP_RATE,
            max_catch_up_ticks: DEFAULT_MAX_CATCH_UP_TICKS,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ArenaConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ARENA_SEED` and `ARENA_TICK_RATE` overrides.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(seed) = std::env::var("ARENA_SEED") {
            self.seed = seed
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("ARENA_SEED is not a number: {seed}")))?;
        }
        if let Ok(rate) = std::env::var("ARENA_TICK_RATE") {
            self.tick_rate = rate
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("ARENA_TICK_RATE is not a number: {rate}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::Invalid(format!("tick_rate must be 1..=1000, got {}", self.tick_rate)));
        }
        if !(0.0..=1.0).contains(&self.soft_wall_rate) {
            return Err(ConfigError::Invalid(format!("soft_wall_rate must be 0..=1, got {}", self.soft_wall_rate)));
        }
        if !(0.0..=1.0).contains(&self.pickup_drop_rate) {
            return Err(ConfigError::Invalid(format!("pickup_drop_rate must be 0..=1, got {}", self.pickup_drop_rate)));
        }
        if self.max_catch_up_ticks == 0 {
            return Err(ConfigError::Invalid("max_catch_up_ticks must be at least 1".into()));
        }
        Ok(())
    }
}
