//! Interface to the external unit of work being checkpointed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

/// Identity of one suspend request.
///
/// The work unit hands the same token back when it confirms the suspend, so
/// the controller matches confirmations by identity rather than by count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuspendToken(Uuid);

impl SuspendToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SuspendToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SuspendToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Why a cycle of work stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The suspend request carrying this token was honored
    Suspended(SuspendToken),
    /// The work ran to its natural end
    Finished,
}

#[derive(Debug)]
pub(crate) struct Signal {
    pub(crate) cycle: u64,
    pub(crate) completion: Completion,
}

/// One-shot channel through which a work unit reports the end of a cycle.
///
/// Reporting consumes the handle, so each cycle reports at most once.
/// Dropping it without reporting ends the controller's run with
/// [`Error::Disconnected`](crate::Error::Disconnected).
#[derive(Debug)]
pub struct CompletionHandle {
    cycle: u64,
    tx: UnboundedSender<Signal>,
}

impl CompletionHandle {
    pub(crate) fn new(cycle: u64, tx: UnboundedSender<Signal>) -> Self {
        Self { cycle, tx }
    }

    /// Cycle this handle was issued for.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Confirm the suspend request identified by `token`.
    pub fn suspended(self, token: SuspendToken) {
        self.report(Completion::Suspended(token));
    }

    /// Report that the work has nothing left to do.
    pub fn finished(self) {
        self.report(Completion::Finished);
    }

    pub fn report(self, completion: Completion) {
        let signal = Signal {
            cycle: self.cycle,
            completion,
        };
        if self.tx.send(signal).is_err() {
            debug!(cycle = self.cycle, ?completion, "Controller gone; completion dropped");
        }
    }
}

/// Error raised by a work unit while starting or suspending.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct WorkUnitError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl WorkUnitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A long-running, stateful job that works inside the checkpointed directory.
///
/// Both methods must return promptly. The outcome of a cycle arrives later
/// through the [`CompletionHandle`] given to `begin`.
#[async_trait]
pub trait WorkUnit: Send {
    /// Start, or resume from the restored directory, one cycle of work.
    async fn begin(
        &mut self,
        identifier: &str,
        completion: CompletionHandle,
    ) -> Result<(), WorkUnitError>;

    /// Ask the running cycle to pause.
    ///
    /// The work confirms with [`CompletionHandle::suspended`] and the same
    /// token once it has stopped touching the directory.
    async fn suspend(&mut self, token: SuspendToken) -> Result<(), WorkUnitError>;
}

#[async_trait]
impl<W: WorkUnit + ?Sized> WorkUnit for Box<W> {
    async fn begin(
        &mut self,
        identifier: &str,
        completion: CompletionHandle,
    ) -> Result<(), WorkUnitError> {
        (**self).begin(identifier, completion).await
    }

    async fn suspend(&mut self, token: SuspendToken) -> Result<(), WorkUnitError> {
        (**self).suspend(token).await
    }
}
