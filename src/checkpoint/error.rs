//! Checkpoint error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during checkpoint operations.
///
/// None of these are retried internally. `restore` and `clear` are safe to
/// call again after any of them.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A create, copy, rename or delete failed
    #[error("Failed to {op} '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking a directory tree failed
    #[error("Failed to walk '{}': {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The live path is missing or is not a directory
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The live path does not end in a directory name (`.`, `..`, a root)
    #[error("'{}' does not end in a directory name", .0.display())]
    UnnamedPath(PathBuf),
}

impl CheckpointError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
