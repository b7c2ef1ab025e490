//! Crate-level error type.

use crate::checkpoint::CheckpointError;
use crate::controller::{ConfigError, WorkUnitError};
use thiserror::Error;

/// Errors surfaced by a controller or by the checkpoint store.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected at construction; nothing was created
    #[error("Invalid controller configuration: {}", describe(.0))]
    Config(Vec<ConfigError>),

    /// Filesystem failure while restoring, creating or clearing
    #[error("Checkpoint operation failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// The work unit failed to begin or suspend
    #[error("Work unit failed: {0}")]
    WorkUnit(#[from] WorkUnitError),

    /// The work unit dropped its completion handle without reporting
    #[error("Work unit dropped its completion handle without reporting")]
    Disconnected,

    #[error("Failed to install log subscriber: {0}")]
    Logging(String),
}

fn describe(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_lists_every_problem() {
        let err = Error::Config(vec![ConfigError::MissingName, ConfigError::ZeroInterval]);
        assert_eq!(
            err.to_string(),
            "Invalid controller configuration: Work unit name not set; \
             Checkpoint interval must be greater than 0"
        );
    }
}
