//! Periodic suspend-checkpoint-resume driver for one work unit.
//!
//! The controller restores the directory, starts the work unit and arms a
//! timer. When the timer fires it asks the work unit to suspend, snapshots
//! the directory once the suspend is confirmed, and starts the next cycle.
//! When the work unit finishes on its own the checkpoint is cleared and the
//! controller stops.
//!
//! Decisions are made by the pure [`Lifecycle`] machine; this module only
//! performs the commands it returns. Checkpoint I/O runs synchronously on
//! the controller's task, so the work unit is always paused (or not yet
//! started) while the directory is copied.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use dircheckpoint::controller::{
//!     CompletionHandle, Controller, ControllerConfig, SuspendToken, WorkUnit, WorkUnitError,
//! };
//! use std::time::Duration;
//!
//! struct Crawl {
//!     handle: Option<CompletionHandle>,
//! }
//!
//! #[async_trait]
//! impl WorkUnit for Crawl {
//!     async fn begin(&mut self, _name: &str, done: CompletionHandle) -> Result<(), WorkUnitError> {
//!         self.handle = Some(done);
//!         Ok(())
//!     }
//!
//!     async fn suspend(&mut self, token: SuspendToken) -> Result<(), WorkUnitError> {
//!         if let Some(done) = self.handle.take() {
//!             done.suspended(token);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> dircheckpoint::Result<()> {
//! let config = ControllerConfig::new("quotes", "jobs/quotes", Duration::from_secs(600));
//! let report = Controller::new(&config, Crawl { handle: None })?.run().await?;
//! println!("finished after {} checkpoints", report.checkpoints);
//! # Ok(())
//! # }
//! ```

mod config;
mod machine;
mod observer;
mod work_unit;

pub use config::{
    ConfigError, ControllerConfig, ValidatedConfig, JOB_DIR_SETTING, RECOMMENDED_MIN_INTERVAL,
};
pub use machine::{Command, Event, Lifecycle, Phase, StepResult};
pub use observer::{LifecycleEvent, Observer, TracingObserver};
pub use work_unit::{Completion, CompletionHandle, SuspendToken, WorkUnit, WorkUnitError};

use crate::checkpoint;
use crate::core::StateHistory;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use stillwater::Validation;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{sleep_until, Instant};
use tracing::warn;
use work_unit::Signal;

/// Summary of a controller that ran to natural completion.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub name: String,
    /// Cycles started, including the one that finished
    pub cycles: u64,
    /// Checkpoints committed
    pub checkpoints: u64,
    /// Wall-clock time from the first to the last phase change
    pub elapsed: Option<Duration>,
    pub history: StateHistory<Phase>,
}

/// Drives one work unit through restore, periodic checkpoints and clear.
pub struct Controller<W: WorkUnit> {
    config: ValidatedConfig,
    work: W,
    lifecycle: Lifecycle,
    observer: Arc<dyn Observer>,
}

impl<W: WorkUnit> Controller<W> {
    /// Validate `config` and bind it to `work`. Nothing is restored or
    /// started until [`Controller::run`].
    pub fn new(config: &ControllerConfig, work: W) -> Result<Self> {
        let config = match config.validate() {
            Validation::Success(config) => config,
            Validation::Failure(errors) => return Err(Error::Config(errors)),
        };

        if config.interval < RECOMMENDED_MIN_INTERVAL {
            warn!(
                name = %config.name,
                interval_secs = config.interval.as_secs(),
                "Checkpoint interval is short; every checkpoint copies the whole directory"
            );
        }

        Ok(Self {
            config,
            work,
            lifecycle: Lifecycle::new(),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn work_unit(&self) -> &W {
        &self.work
    }

    /// Run cycles until the work unit finishes naturally.
    ///
    /// Any filesystem or work unit error aborts the run. A later run
    /// restores from the last committed checkpoint. A work unit that drops
    /// its [`CompletionHandle`] without reporting ends the run with
    /// [`Error::Disconnected`].
    pub async fn run(mut self) -> Result<RunReport> {
        let mut completions: Option<UnboundedReceiver<Signal>> = None;
        let mut deadline: Option<Instant> = None;
        let mut queue = VecDeque::from([Event::Start]);

        loop {
            while let Some(event) = queue.pop_front() {
                for command in self.dispatch(&event) {
                    let next = self
                        .execute(command, &mut completions, &mut deadline)
                        .await?;
                    queue.extend(next);
                }
            }

            if self.lifecycle.is_final() {
                break;
            }

            let event = tokio::select! {
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    Event::TimerExpired { token: SuspendToken::new() }
                }
                signal = next_signal(&mut completions) => match signal {
                    Some(Signal { completion: Completion::Suspended(token), .. }) => {
                        Event::SuspendConfirmed { token }
                    }
                    Some(Signal { cycle, completion: Completion::Finished }) => {
                        Event::WorkFinished { cycle }
                    }
                    None => return Err(Error::Disconnected),
                },
            };
            queue.push_back(event);
        }

        Ok(RunReport {
            name: self.config.name,
            cycles: self.lifecycle.cycle() + 1,
            checkpoints: self.lifecycle.cycle(),
            elapsed: self.lifecycle.history().duration(),
            history: self.lifecycle.history().clone(),
        })
    }

    fn dispatch(&mut self, event: &Event) -> Vec<Command> {
        match self.lifecycle.handle(event) {
            StepResult::Transitioned {
                from,
                to,
                cycle,
                commands,
                ..
            } => {
                self.observer
                    .observe(&LifecycleEvent::Transitioned { from, to, cycle });
                commands
            }
            StepResult::Ignored { reason } => {
                self.observer.observe(&LifecycleEvent::EventIgnored {
                    phase: self.lifecycle.current_phase(),
                    reason,
                });
                Vec::new()
            }
        }
    }

    async fn execute(
        &mut self,
        command: Command,
        completions: &mut Option<UnboundedReceiver<Signal>>,
        deadline: &mut Option<Instant>,
    ) -> Result<Option<Event>> {
        let path = &self.config.path;
        match command {
            Command::Restore => {
                self.observer.observe(&LifecycleEvent::RestoreStarted { path: path.clone() });
                let outcome = checkpoint::restore(path)?;
                self.observer.observe(&LifecycleEvent::Restored {
                    path: path.clone(),
                    outcome,
                });
            }
            Command::Begin { cycle } => {
                // The handle holds the only sender, so the channel closes if
                // the work unit drops it unreported.
                let (tx, rx) = mpsc::unbounded_channel();
                *completions = Some(rx);
                self.work
                    .begin(&self.config.name, CompletionHandle::new(cycle, tx))
                    .await?;
                self.observer.observe(&LifecycleEvent::Began {
                    name: self.config.name.clone(),
                    cycle,
                });
            }
            Command::ArmTimer => {
                *deadline = Some(Instant::now() + self.config.interval);
            }
            Command::Suspend(token) => {
                self.observer.observe(&LifecycleEvent::SuspendRequested {
                    token,
                    cycle: self.lifecycle.cycle(),
                });
                self.work.suspend(token).await?;
            }
            Command::CreateCheckpoint => {
                checkpoint::create(path)?;
                self.observer.observe(&LifecycleEvent::CheckpointCreated {
                    path: path.clone(),
                    cycle: self.lifecycle.cycle(),
                    suppressed: self.lifecycle.suppressed(),
                });
                return Ok(Some(Event::CheckpointCommitted));
            }
            Command::ClearCheckpoint => {
                checkpoint::clear(path)?;
                self.observer
                    .observe(&LifecycleEvent::Cleared { path: path.clone() });
            }
            Command::Stop => {
                *deadline = None;
            }
        }
        Ok(None)
    }
}

async fn next_signal(completions: &mut Option<UnboundedReceiver<Signal>>) -> Option<Signal> {
    match completions {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

/// Run several controllers to completion on the caller's task.
///
/// All controllers share one cooperative scheduler; a checkpoint copy in one
/// of them blocks the others for its duration.
pub async fn run_all<W, I>(controllers: I) -> Result<Vec<RunReport>>
where
    W: WorkUnit,
    I: IntoIterator<Item = Controller<W>>,
{
    futures::future::try_join_all(controllers.into_iter().map(Controller::run)).await
}
