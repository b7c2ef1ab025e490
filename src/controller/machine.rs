//! Pure lifecycle state machine for the suspend-checkpoint-resume cycle.
//!
//! `step` decides what an event means in the current phase and which
//! commands the shell must run; `apply_result` records the decision. Neither
//! performs I/O.

use crate::controller::work_unit::SuspendToken;
use crate::core::{State, StateHistory, StateTransition};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Phase of a controlled work unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Phase {
    /// Constructed, nothing restored yet
    Init,
    /// Work unit is running; a suspend timer is armed
    Running,
    /// Suspend requested, waiting for the confirmation
    Suspending,
    /// Work unit paused, snapshot being written
    Checkpointing,
    /// Work ran to its natural end; checkpoint cleared
    Finished,
}

impl State for Phase {
    fn name(&self) -> &str {
        match self {
            Self::Init => "Init",
            Self::Running => "Running",
            Self::Suspending => "Suspending",
            Self::Checkpointing => "Checkpointing",
            Self::Finished => "Finished",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Something that happened to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Controller started
    Start,
    /// The checkpoint interval elapsed; `token` identifies the suspend to request
    TimerExpired { token: SuspendToken },
    /// The work unit honored the suspend identified by `token`
    SuspendConfirmed { token: SuspendToken },
    /// The work unit finished naturally during `cycle`
    WorkFinished { cycle: u64 },
    /// The snapshot of the paused work unit was committed
    CheckpointCommitted,
}

/// Side effect the shell must perform, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Restore,
    Begin { cycle: u64 },
    ArmTimer,
    Suspend(SuspendToken),
    CreateCheckpoint,
    ClearCheckpoint,
    Stop,
}

/// Outcome of feeding one event to the machine.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult {
    Transitioned {
        from: Phase,
        to: Phase,
        cycle: u64,
        pending: Option<SuspendToken>,
        commands: Vec<Command>,
    },
    /// The event does not apply to the current phase and changes nothing
    Ignored { reason: String },
}

/// Lifecycle bookkeeping for one controller.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    current: Phase,
    cycle: u64,
    pending: Option<SuspendToken>,
    history: StateHistory<Phase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current: Phase::Init,
            cycle: 0,
            pending: None,
            history: StateHistory::new(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current
    }

    /// Current cycle. Equals the number of committed checkpoints.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Suspend requests whose confirmation has not arrived yet.
    pub fn suppressed(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    pub fn is_final(&self) -> bool {
        self.current.is_final()
    }

    pub fn history(&self) -> &StateHistory<Phase> {
        &self.history
    }

    /// Decide how `event` moves the machine (pure).
    pub fn step(&self, event: &Event) -> StepResult {
        let cycle = self.cycle;
        let to = |to: Phase, cycle: u64, pending: Option<SuspendToken>, commands: Vec<Command>| {
            StepResult::Transitioned {
                from: self.current,
                to,
                cycle,
                pending,
                commands,
            }
        };

        match (self.current, event) {
            (Phase::Init, Event::Start) => to(
                Phase::Running,
                cycle,
                None,
                vec![Command::Restore, Command::Begin { cycle }, Command::ArmTimer],
            ),
            (Phase::Running, Event::TimerExpired { token }) => to(
                Phase::Suspending,
                cycle,
                Some(*token),
                vec![Command::Suspend(*token)],
            ),
            (Phase::Suspending, Event::SuspendConfirmed { token })
                if self.pending == Some(*token) =>
            {
                to(Phase::Checkpointing, cycle, None, vec![Command::CreateCheckpoint])
            }
            (Phase::Checkpointing, Event::CheckpointCommitted) => to(
                Phase::Running,
                cycle + 1,
                None,
                vec![Command::Begin { cycle: cycle + 1 }, Command::ArmTimer],
            ),
            (Phase::Running | Phase::Suspending, Event::WorkFinished { cycle: finished })
                if *finished == cycle =>
            {
                to(
                    Phase::Finished,
                    cycle,
                    None,
                    vec![Command::ClearCheckpoint, Command::Stop],
                )
            }
            (phase, event) => StepResult::Ignored {
                reason: ignore_reason(phase, event, self.pending, cycle),
            },
        }
    }

    /// Record a decision made by [`Lifecycle::step`].
    pub fn apply_result(&mut self, result: &StepResult) {
        if let StepResult::Transitioned {
            from,
            to,
            cycle,
            pending,
            ..
        } = result
        {
            self.history = self.history.record(StateTransition {
                from: *from,
                to: *to,
                timestamp: Utc::now(),
                cycle: *cycle,
            });
            self.current = *to;
            self.cycle = *cycle;
            self.pending = *pending;
        }
    }

    /// `step` followed by `apply_result`.
    pub fn handle(&mut self, event: &Event) -> StepResult {
        let result = self.step(event);
        self.apply_result(&result);
        result
    }
}

fn ignore_reason(
    phase: Phase,
    event: &Event,
    pending: Option<SuspendToken>,
    cycle: u64,
) -> String {
    match event {
        Event::SuspendConfirmed { token } if phase == Phase::Suspending => match pending {
            Some(expected) => format!("confirmation for {token} does not match pending {expected}"),
            None => format!("confirmation for {token} with no suspend pending"),
        },
        Event::WorkFinished { cycle: finished } if *finished != cycle => {
            format!("completion from cycle {finished} while in cycle {cycle}")
        }
        _ => format!("{event:?} does not apply in phase {}", phase.name()),
    }
}
