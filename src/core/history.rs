//! Record of lifecycle phase changes.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single phase change.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// Phase being left
    pub from: S,
    /// Phase being entered
    pub to: S,
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
    /// Suspend-checkpoint-resume cycle the change belongs to
    pub cycle: u64,
}

/// Ordered, append-only history of phase changes.
///
/// `record` returns a new history and leaves the receiver untouched.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use dircheckpoint::controller::Phase;
/// use dircheckpoint::core::{StateHistory, StateTransition};
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: Phase::Init,
///         to: Phase::Running,
///         timestamp: Utc::now(),
///         cycle: 0,
///     })
///     .record(StateTransition {
///         from: Phase::Running,
///         to: Phase::Finished,
///         timestamp: Utc::now(),
///         cycle: 0,
///     });
///
/// assert_eq!(
///     history.get_path(),
///     vec![&Phase::Init, &Phase::Running, &Phase::Finished]
/// );
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Return a new history with `transition` appended.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// States visited, starting with the first `from`.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        path.extend(self.transitions.iter().map(|t| &t.to));
        path
    }

    /// Number of times `state` was entered.
    pub fn entries_into(&self, state: &S) -> usize {
        self.transitions.iter().filter(|t| t.to == *state).count()
    }

    /// Time between the first and last recorded change.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.first()?, self.transitions.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }
}
