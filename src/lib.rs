//! Dircheckpoint: periodic, crash-safe checkpoints of a working directory
//!
//! A long-running job keeps its state in a directory. A [`Controller`]
//! restores that directory from the last committed snapshot, starts the job,
//! and every interval asks it to pause, snapshots the directory and resumes
//! it. When the job finishes on its own the snapshot is cleared.
//!
//! Snapshots are taken with create, copy, rename and delete only, so an
//! interruption at any point leaves the directory recoverable by the next
//! [`checkpoint::restore`].
//!
//! # Modules
//!
//! - [`checkpoint`]: the on-disk snapshot protocol
//! - [`controller`]: the suspend/checkpoint/resume driver and its work unit interface
//! - [`core`]: the phase and history primitives the controller is built on
//!
//! # Example
//!
//! ```rust
//! use dircheckpoint::controller::{Lifecycle, Event, Phase};
//!
//! let mut lifecycle = Lifecycle::new();
//! lifecycle.handle(&Event::Start);
//! assert_eq!(lifecycle.current_phase(), Phase::Running);
//! ```

pub mod checkpoint;
pub mod controller;
pub mod core;
pub mod error;
pub mod logging;

pub use checkpoint::CheckpointError;
pub use controller::{
    run_all, CompletionHandle, Controller, ControllerConfig, RunReport, SuspendToken, WorkUnit,
    WorkUnitError,
};
pub use core::{State, StateHistory, StateTransition};
pub use error::{Error, Result};
pub use logging::init_logging;
