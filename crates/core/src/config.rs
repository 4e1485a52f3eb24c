// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration
//!
//! A run is fully described by its runner count, stage count and execution
//! model. Optional TOML files may also carry the simulated work range:
//!
//! ```toml
//! participants = 5
//! stages = 3
//! model = "multi-process"
//!
//! [work]
//! min = "1s"
//! max = "5s"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How participants are hosted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionModel {
    /// Concurrent threads in one address space
    #[default]
    Threaded,
    /// Forked processes sharing the barriers through shared memory
    MultiProcess,
}

impl ExecutionModel {
    /// Whether the barriers must live in cross-process shared memory
    pub fn needs_shared_storage(self) -> bool {
        matches!(self, ExecutionModel::MultiProcess)
    }
}

impl fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionModel::Threaded => write!(f, "threaded"),
            ExecutionModel::MultiProcess => write!(f, "multi-process"),
        }
    }
}

impl FromStr for ExecutionModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threaded" | "threads" | "thread" => Ok(ExecutionModel::Threaded),
            "multi-process" | "multiprocess" | "processes" | "process" => {
                Ok(ExecutionModel::MultiProcess)
            }
            other => Err(ConfigError::UnknownModel(other.to_string())),
        }
    }
}

/// Shape of one run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of runners; the coordinator is extra
    pub participants: u32,
    pub stages: u32,
    #[serde(default)]
    pub model: ExecutionModel,
}

impl RunConfig {
    pub fn new(participants: u32, stages: u32, model: ExecutionModel) -> Self {
        Self {
            participants,
            stages,
            model,
        }
    }

    /// Read a run shape from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = FileConfig::load(path)?.run_config();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants == 0 {
            return Err(ConfigError::ZeroParticipants);
        }
        if self.stages == 0 {
            return Err(ConfigError::ZeroStages);
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(5, 3, ExecutionModel::Threaded)
    }
}

/// Bounds for simulated stage work
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkConfig {
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    #[serde(with = "humantime_serde")]
    pub max: Duration,
    /// Fixed seed for reproducible durations
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WorkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedWorkRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(5),
            seed: None,
        }
    }
}

/// Contents of a configuration file
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub participants: Option<u32>,
    pub stages: Option<u32>,
    pub model: Option<ExecutionModel>,
    pub work: Option<WorkConfig>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: FileConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), ?config, "loaded config file");
        Ok(config)
    }

    /// Fill the run shape from this file, falling back to defaults
    pub fn run_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            participants: self.participants.unwrap_or(defaults.participants),
            stages: self.stages.unwrap_or(defaults.stages),
            model: self.model.unwrap_or(defaults.model),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
