//! Atomic directory checkpoints built from create, rename and delete.
//!
//! A checkpoint of a directory lives in sibling slot directories:
//!
//! ```text
//! job              live directory
//! job_cp_ip.k7q2   snapshot being written
//! job_cp_old.k7q2  previous snapshot, demoted during a create
//! job_cp.k7q2      last committed snapshot
//! ```
//!
//! [`create`] writes the in-progress slot completely before it demotes the
//! committed one, so the presence of the old slot always means the
//! in-progress slot is whole. [`restore`] uses that to converge after an
//! interruption at any step.
//!
//! # Example
//!
//! ```rust
//! use dircheckpoint::checkpoint;
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let job = tmp.path().join("job");
//! std::fs::create_dir_all(&job).unwrap();
//! std::fs::write(job.join("seen.txt"), "page-1").unwrap();
//!
//! checkpoint::create(&job).unwrap();
//! std::fs::write(job.join("seen.txt"), "half-written").unwrap();
//!
//! checkpoint::restore(&job).unwrap();
//! assert_eq!(std::fs::read_to_string(job.join("seen.txt")).unwrap(), "page-1");
//! ```

pub mod error;
mod fs;
pub mod slot;
mod store;

pub use error::CheckpointError;
pub use slot::{has_slot_name, slot_path, Slot, SLOT_TOKEN};
pub use store::{
    clear, create, create_empty, has_checkpoint, restore, run_create_step, CreateStep,
    RestoreOutcome, Source,
};
