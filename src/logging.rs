//! Log subscriber setup for processes that host controllers.

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `LEVEL: message` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when set. Fails if a
/// global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
