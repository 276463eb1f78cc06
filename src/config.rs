//! Scheduler tuning and server settings.
//!
//! `SchedulerConfig` holds the soft-constraint weights and the search bounds.
//! Callers send a partial `SchedulerConfigOverrides` with each run, which is
//! merged shallowly on top of a base config.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Penalty weights for the soft constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftConstraintWeights {
    pub trainer_gap: u32,
    pub subject_repeat_in_day: u32,
    pub trainer_daily_overload: u32,
    pub subject_spread: u32,
    /// Present for compatibility with stored configs. Not applied by the evaluator.
    pub building_mismatch: u32,
}

impl Default for SoftConstraintWeights {
    fn default() -> Self {
        Self {
            trainer_gap: 5,
            subject_repeat_in_day: 10,
            trainer_daily_overload: 8,
            subject_spread: 3,
            building_mismatch: 2,
        }
    }
}

/// Parameters for one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    pub weights: SoftConstraintWeights,
    /// Upper bound on backtrack steps across the whole placement phase.
    pub max_backtrack_depth: u32,
    pub optimization_passes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weights: SoftConstraintWeights::default(),
            max_backtrack_depth: 100,
            optimization_passes: 3,
        }
    }
}

/// Caller-supplied partial config. Missing fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfigOverrides {
    #[serde(default)]
    pub weights: Option<SoftConstraintWeights>,
    #[serde(default)]
    pub max_backtrack_depth: Option<u32>,
    #[serde(default)]
    pub optimization_passes: Option<u32>,
}

impl SchedulerConfig {
    /// Returns a copy of `self` with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &SchedulerConfigOverrides) -> Self {
        Self {
            weights: overrides.weights.unwrap_or(self.weights),
            max_backtrack_depth: overrides
                .max_backtrack_depth
                .unwrap_or(self.max_backtrack_depth),
            optimization_passes: overrides
                .optimization_passes
                .unwrap_or(self.optimization_passes),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Loads a base config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read or isn't a valid config.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Settings for the HTTP binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub config_path: Option<PathBuf>,
    /// Max number of solves running at once.
    pub max_concurrent_solves: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            config_path: None,
            max_concurrent_solves: 4,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `SCHEDULER_CONFIG` and `MAX_CONCURRENT_SOLVES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            config_path: env::var_os("SCHEDULER_CONFIG").map(PathBuf::from),
            max_concurrent_solves: env::var("MAX_CONCURRENT_SOLVES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_solves),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ScheduleError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ScheduleError::Config(format!("invalid bind address: {e}")))
    }

    /// Base scheduler config: the configured file if any, else defaults.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ScheduleError> {
        match &self.config_path {
            Some(path) => SchedulerConfig::from_json_file(path),
            None => Ok(SchedulerConfig::default()),
        }
    }
}
