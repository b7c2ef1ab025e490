//! Structured lifecycle events and the sink they are written to.

use crate::checkpoint::RestoreOutcome;
use crate::controller::machine::Phase;
use crate::controller::work_unit::SuspendToken;
use crate::core::State;
use std::path::PathBuf;
use tracing::{info, warn};

/// Something observable that a controller did.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    RestoreStarted {
        path: PathBuf,
    },
    Restored {
        path: PathBuf,
        outcome: RestoreOutcome,
    },
    Began {
        name: String,
        cycle: u64,
    },
    SuspendRequested {
        token: SuspendToken,
        cycle: u64,
    },
    CheckpointCreated {
        path: PathBuf,
        cycle: u64,
        suppressed: usize,
    },
    Cleared {
        path: PathBuf,
    },
    Transitioned {
        from: Phase,
        to: Phase,
        cycle: u64,
    },
    EventIgnored {
        phase: Phase,
        reason: String,
    },
}

/// Sink for lifecycle events, injected into each controller.
pub trait Observer: Send + Sync {
    fn observe(&self, event: &LifecycleEvent);
}

/// Default observer: renders every event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::RestoreStarted { path } => {
                info!(path = %path.display(), "Restoring checkpoint");
            }
            LifecycleEvent::Restored { path, outcome } => {
                info!(path = %path.display(), ?outcome, "Checkpoint successfully restored");
            }
            LifecycleEvent::Began { name, cycle } => {
                info!(%name, cycle, "Work unit started");
            }
            LifecycleEvent::SuspendRequested { token, cycle } => {
                info!(%token, cycle, "Suspending work unit for checkpoint");
            }
            LifecycleEvent::CheckpointCreated { path, cycle, .. } => {
                info!(path = %path.display(), cycle, "Checkpoint successfully created");
            }
            LifecycleEvent::Cleared { path } => {
                info!(path = %path.display(), "Successfully cleared checkpoint");
            }
            LifecycleEvent::Transitioned { from, to, cycle } => {
                tracing::debug!(from = from.name(), to = to.name(), cycle, "Phase changed");
            }
            LifecycleEvent::EventIgnored { phase, reason } => {
                warn!(phase = phase.name(), %reason, "Ignoring lifecycle event");
            }
        }
    }
}
