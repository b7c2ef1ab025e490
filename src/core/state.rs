//! State trait for lifecycle phases.
//!
//! Phases are plain values; inspecting them has no side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A phase of a lifecycle state machine.
///
/// # Example
///
/// ```rust
/// use dircheckpoint::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Job {
///     Queued,
///     Crawling,
///     Done,
/// }
///
/// impl State for Job {
///     fn name(&self) -> &str {
///         match self {
///             Self::Queued => "Queued",
///             Self::Crawling => "Crawling",
///             Self::Done => "Done",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Done)
///     }
/// }
///
/// assert!(Job::Done.is_final());
/// assert!(!Job::Crawling.is_final());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Name used in logs and lifecycle events.
    fn name(&self) -> &str;

    /// Whether no further transitions are expected from this state.
    fn is_final(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Light {
        Off,
        On,
        Burnt,
    }

    impl State for Light {
        fn name(&self) -> &str {
            match self {
                Self::Off => "Off",
                Self::On => "On",
                Self::Burnt => "Burnt",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Burnt)
        }
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Unit;

    impl State for Unit {
        fn name(&self) -> &str {
            "Unit"
        }
    }

    #[test]
    fn default_is_not_final() {
        assert!(!Unit.is_final());
    }

    #[test]
    fn overrides_are_respected() {
        assert!(!Light::Off.is_final());
        assert!(!Light::On.is_final());
        assert!(Light::Burnt.is_final());
        assert_eq!(Light::On.name(), "On");
    }
}
