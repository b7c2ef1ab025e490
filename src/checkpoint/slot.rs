//! Checkpoint slot naming.
//!
//! A slot is a sibling directory of the live directory, named by appending a
//! fixed suffix to the live path. The mapping is pure and does not touch the
//! filesystem.

use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Disambiguating token shared by every slot suffix.
///
/// Changing it orphans every checkpoint written by an earlier build.
pub const SLOT_TOKEN: &str = ".k7q2";

/// A generation of a directory snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Snapshot currently being written. Only a recovery source when
    /// paired with [`Slot::Old`].
    InProgress,

    /// Previous committed snapshot, demoted while a new one is installed.
    Old,

    /// Last fully committed snapshot.
    Current,
}

impl Slot {
    /// Every slot kind, in the order they appear during a create.
    pub const ALL: [Slot; 3] = [Slot::InProgress, Slot::Old, Slot::Current];

    /// Suffix appended to the live path to name this slot.
    pub fn suffix(self) -> &'static str {
        match self {
            Slot::InProgress => "_cp_ip.k7q2",
            Slot::Old => "_cp_old.k7q2",
            Slot::Current => "_cp.k7q2",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::InProgress => "in-progress",
            Slot::Old => "old",
            Slot::Current => "current",
        };
        f.write_str(name)
    }
}

/// Whether `dir` ends in a directory name, so its slots are siblings of it.
///
/// Paths ending in `.` or `..`, or consisting only of a root or prefix,
/// have no name to suffix; their slots would land inside the live directory.
pub fn has_slot_name(dir: &Path) -> bool {
    matches!(dir.components().next_back(), Some(Component::Normal(_)))
}

/// Physical location of `slot` for the live directory `dir`.
///
/// Trailing separators on `dir` are dropped first. When
/// [`has_slot_name`] holds the slot is a sibling of the directory, never a
/// child of it.
pub fn slot_path(dir: &Path, slot: Slot) -> PathBuf {
    let normalized: PathBuf = dir.components().collect();
    let mut name = OsString::from(normalized.into_os_string());
    name.push(slot.suffix());
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn suffixes_share_the_token() {
        for slot in Slot::ALL {
            assert!(slot.suffix().ends_with(SLOT_TOKEN), "{slot}");
        }
    }

    #[test]
    fn suffixes_are_distinct() {
        let suffixes: HashSet<_> = Slot::ALL.iter().map(|s| s.suffix()).collect();
        assert_eq!(suffixes.len(), Slot::ALL.len());
    }

    #[test]
    fn slot_path_appends_suffix() {
        let dir = Path::new("jobs/crawl");
        assert_eq!(
            slot_path(dir, Slot::Current),
            PathBuf::from("jobs/crawl_cp.k7q2")
        );
        assert_eq!(
            slot_path(dir, Slot::InProgress),
            PathBuf::from("jobs/crawl_cp_ip.k7q2")
        );
        assert_eq!(
            slot_path(dir, Slot::Old),
            PathBuf::from("jobs/crawl_cp_old.k7q2")
        );
    }

    #[test]
    fn trailing_separator_does_not_nest_slot() {
        assert_eq!(
            slot_path(Path::new("jobs/crawl/"), Slot::Current),
            slot_path(Path::new("jobs/crawl"), Slot::Current)
        );
    }

    #[test]
    fn paths_without_final_name_are_rejected() {
        assert!(has_slot_name(Path::new("jobs/crawl")));
        assert!(has_slot_name(Path::new("jobs/crawl/")));
        assert!(has_slot_name(Path::new("jobs/crawl/.")));
        assert!(!has_slot_name(Path::new(".")));
        assert!(!has_slot_name(Path::new("jobs/crawl/..")));
        assert!(!has_slot_name(Path::new("/")));
        assert!(!has_slot_name(Path::new("")));
    }

    #[test]
    fn slots_are_siblings() {
        let dir = Path::new("/var/lib/job");
        for slot in Slot::ALL {
            assert_eq!(slot_path(dir, slot).parent(), dir.parent());
        }
    }
}
