//! Controller configuration and its validation.
//!
//! Validation accumulates every problem instead of stopping at the first, so
//! a broken config file is reported in one pass.

use crate::checkpoint::has_slot_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use stillwater::Validation;
use thiserror::Error;

/// Setting consulted for the directory when `path` is not given.
pub const JOB_DIR_SETTING: &str = "JOBDIR";

/// Shortest interval that does not trigger a warning. A checkpoint copies
/// the whole directory, so intervals are expected in the hundreds of seconds.
pub const RECOMMENDED_MIN_INTERVAL: Duration = Duration::from_secs(100);

/// Problems found in a [`ControllerConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Work unit name not set")]
    MissingName,

    #[error("Checkpoint path not set (set `path` or the JOBDIR setting)")]
    MissingPath,

    #[error("Checkpoint path '{}' exists but is not a directory", .0.display())]
    PathNotDirectory(PathBuf),

    #[error("Checkpoint path '{}' must end in a directory name", .0.display())]
    PathNotNamed(PathBuf),

    #[error("Checkpoint interval not set")]
    MissingInterval,

    #[error("Checkpoint interval must be greater than 0")]
    ZeroInterval,

    #[error("Invalid configuration file: {0}")]
    Parse(String),
}

/// Settings for one controlled work unit, as written by the user.
///
/// ```toml
/// name = "quotes"
/// path = "jobs/quotes"
/// interval_secs = 600
///
/// [settings]
/// LOG_FILE = "logs.txt"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Identifier handed to the work unit on every begin
    #[serde(default)]
    pub name: Option<String>,

    /// Directory to checkpoint
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Seconds between checkpoints
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Work-unit specific settings, opaque to the controller
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// A config that passed validation.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub name: String,
    pub path: PathBuf,
    pub interval: Duration,
    pub settings: Map<String, Value>,
}

impl ControllerConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            name: Some(name.into()),
            path: Some(path.into()),
            interval_secs: Some(interval.as_secs()),
            settings: Map::new(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Add or override a work-unit setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Directory to checkpoint: `path`, else the `JOBDIR` setting.
    pub fn job_dir(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            self.settings
                .get(JOB_DIR_SETTING)
                .and_then(Value::as_str)
                .map(PathBuf::from)
        })
    }

    /// Check every field, collecting all errors.
    pub fn validate(&self) -> Validation<ValidatedConfig, Vec<ConfigError>> {
        let mut errors = Vec::new();

        let name = self.name.clone().filter(|n| !n.trim().is_empty());
        if name.is_none() {
            errors.push(ConfigError::MissingName);
        }

        let path = self.job_dir().filter(|p| !p.as_os_str().is_empty());
        match &path {
            None => errors.push(ConfigError::MissingPath),
            Some(p) if !has_slot_name(p) => errors.push(ConfigError::PathNotNamed(p.clone())),
            Some(p) if p.exists() && !p.is_dir() => {
                errors.push(ConfigError::PathNotDirectory(p.clone()));
            }
            Some(_) => {}
        }

        match self.interval_secs {
            None => errors.push(ConfigError::MissingInterval),
            Some(0) => errors.push(ConfigError::ZeroInterval),
            Some(_) => {}
        }

        match (name, path, self.interval_secs) {
            (Some(name), Some(path), Some(secs)) if errors.is_empty() => {
                Validation::Success(ValidatedConfig {
                    name,
                    path,
                    interval: Duration::from_secs(secs),
                    settings: self.settings.clone(),
                })
            }
            _ => Validation::Failure(errors),
        }
    }
}
