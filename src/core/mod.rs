//! Pure lifecycle primitives.
//!
//! - `State`: what a lifecycle phase must be able to report about itself
//! - `StateHistory`: an append-only record of phase changes
//!
//! Nothing here touches the filesystem or a runtime.

mod history;
mod state;

pub use history::{StateHistory, StateTransition};
pub use state::State;
