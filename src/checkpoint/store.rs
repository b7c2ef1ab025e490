//! Crash-safe checkpoint, restore and clear over a single directory.
//!
//! The store keeps no state of its own: everything it needs is inferred from
//! which slot directories exist next to the live directory. Callers must make
//! sure nothing else mutates the live directory while an operation runs.

use super::error::CheckpointError;
use super::fs;
use super::slot::{has_slot_name, slot_path, Slot};
use std::path::Path;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, CheckpointError>;

/// One step of the create sequence.
///
/// Running every step of [`CreateStep::SEQUENCE`] in order is a complete
/// `create`. Stopping after any prefix leaves the slots exactly as a crash at
/// that point would, and [`restore`] recovers from all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateStep {
    /// Write the new generation into the in-progress slot
    CopyToInProgress,
    /// Rename the committed snapshot, if any, to the old slot
    DemoteCurrent,
    /// Rename the in-progress slot to the committed slot
    PromoteInProgress,
    /// Delete the old slot
    DropOld,
}

impl CreateStep {
    pub const SEQUENCE: [CreateStep; 4] = [
        CreateStep::CopyToInProgress,
        CreateStep::DemoteCurrent,
        CreateStep::PromoteInProgress,
        CreateStep::DropOld,
    ];
}

/// Contents of a new generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Copy the live directory
    Live,
    /// Install an empty snapshot
    Empty,
}

/// How [`restore`] materialized the live directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Copied from the committed snapshot
    FromCurrent,
    /// An interrupted create was completed first, then copied
    Recovered,
    /// No snapshot was ever committed; the directory was reset to empty
    Fresh,
}

fn ensure_slot_name(path: &Path) -> Result<()> {
    if has_slot_name(path) {
        Ok(())
    } else {
        Err(CheckpointError::UnnamedPath(path.to_path_buf()))
    }
}

/// Run a single step of the create sequence against `path`.
pub fn run_create_step(path: &Path, step: CreateStep, source: Source) -> Result<()> {
    ensure_slot_name(path)?;
    let in_progress = slot_path(path, Slot::InProgress);
    let old = slot_path(path, Slot::Old);
    let current = slot_path(path, Slot::Current);

    match step {
        CreateStep::CopyToInProgress => {
            if source == Source::Live && !fs::is_dir(path) {
                return Err(CheckpointError::NotADirectory(path.to_path_buf()));
            }
            if fs::remove_if_present(&in_progress)? {
                debug!(slot = %in_progress.display(), "Discarded stale in-progress snapshot");
            }
            match source {
                Source::Live => fs::copy_dir_contents(path, &in_progress)?,
                Source::Empty => fs::reset_dir(&in_progress)?,
            }
            debug!(slot = %in_progress.display(), ?source, "Wrote in-progress snapshot");
        }
        CreateStep::DemoteCurrent => {
            if fs::is_dir(&current) {
                // With a committed snapshot present, any old slot is leftover
                // from an interrupted delete and must not block the rename.
                fs::remove_if_present(&old)?;
                fs::rename(&current, &old)?;
                debug!(slot = %old.display(), "Demoted committed snapshot");
            }
        }
        CreateStep::PromoteInProgress => {
            fs::rename(&in_progress, &current)?;
            debug!(slot = %current.display(), "Committed snapshot");
        }
        CreateStep::DropOld => {
            if fs::remove_if_present(&old)? {
                debug!(slot = %old.display(), "Deleted old snapshot");
            }
        }
    }

    Ok(())
}

fn create_from(path: &Path, source: Source) -> Result<()> {
    for step in CreateStep::SEQUENCE {
        run_create_step(path, step, source)?;
    }
    Ok(())
}

/// Snapshot the live directory at `path`.
///
/// On success the live directory is unchanged and the committed slot holds a
/// copy of it. A partially written snapshot is never exposed as committed.
pub fn create(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "Creating checkpoint");
    create_from(path, Source::Live)?;
    debug!(path = %path.display(), "Checkpoint successfully created");
    Ok(())
}

/// Install an empty committed snapshot through the same sequence as [`create`].
pub fn create_empty(path: &Path) -> Result<()> {
    create_from(path, Source::Empty)
}

/// Bring the live directory at `path` back to the last committed snapshot.
///
/// Recovers from an interruption at any point of [`create`] or [`clear`].
/// Afterwards only the committed slot may remain. When nothing was ever
/// committed the live directory is reset to empty, discarding its contents.
pub fn restore(path: &Path) -> Result<RestoreOutcome> {
    ensure_slot_name(path)?;
    debug!(path = %path.display(), "Restoring checkpoint");

    let in_progress = slot_path(path, Slot::InProgress);
    let old = slot_path(path, Slot::Old);
    let current = slot_path(path, Slot::Current);

    let mut outcome = RestoreOutcome::FromCurrent;
    if !fs::is_dir(&current) && fs::is_dir(&old) {
        // The old slot only appears once the in-progress copy is complete,
        // so the interrupted create can be finished.
        if fs::is_dir(&in_progress) {
            fs::rename(&in_progress, &current)?;
        } else {
            warn!(
                slot = %old.display(),
                "Old snapshot present without an in-progress snapshot; reinstating it"
            );
            fs::rename(&old, &current)?;
        }
        outcome = RestoreOutcome::Recovered;
    }

    if fs::is_dir(&current) {
        fs::reset_dir(path)?;
        fs::copy_dir_contents(&current, path)?;
    } else {
        fs::reset_dir(path)?;
        outcome = RestoreOutcome::Fresh;
    }

    fs::remove_if_present(&old)?;
    fs::remove_if_present(&in_progress)?;

    debug!(path = %path.display(), ?outcome, "Checkpoint successfully restored");
    Ok(outcome)
}

/// Remove any committed snapshot of `path`.
///
/// The committed slot is first rotated out by installing an empty snapshot,
/// so an interrupted clear is recovered by [`restore`] like any create.
pub fn clear(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "Clearing checkpoint");
    create_empty(path)?;
    fs::remove_if_present(&slot_path(path, Slot::Current))?;
    debug!(path = %path.display(), "Successfully cleared checkpoint");
    Ok(())
}

/// Whether a committed snapshot exists for `path`.
pub fn has_checkpoint(path: &Path) -> bool {
    has_slot_name(path) && fs::is_dir(&slot_path(path, Slot::Current))
}
