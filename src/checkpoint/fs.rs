//! Filesystem primitives used by the checkpoint protocol.
//!
//! Only create, copy, rename and delete are used. Every helper attaches the
//! failing operation and path to its error.

use super::error::CheckpointError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{trace, warn};
use walkdir::WalkDir;

type Result<T> = std::result::Result<T, CheckpointError>;

/// Copy everything under `src` into `dst`, creating `dst` if needed.
///
/// Regular files are copied by content, directories are recreated, and on
/// unix symlinks are recreated as symlinks. Other entry types are skipped.
pub(crate) fn copy_dir_contents(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| CheckpointError::io("create directory", dst, e))?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|source| CheckpointError::Walk {
            root: src.to_path_buf(),
            source,
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| CheckpointError::NotADirectory(src.to_path_buf()))?;
        let out = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&out).map_err(|e| CheckpointError::io("create directory", &out, e))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &out).map_err(|e| CheckpointError::io("copy", entry.path(), e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &out)?;
        } else {
            warn!(path = %entry.path().display(), "Skipping special file");
            continue;
        }
        trace!(path = %rel.display(), "Copied entry");
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| CheckpointError::io("read link", src, e))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| CheckpointError::io("create symlink", dst, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> Result<()> {
    warn!(path = %src.display(), "Skipping symlink");
    Ok(())
}

/// Delete `path` and everything under it. A missing path is not an error.
pub(crate) fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)
            .map(|()| true)
            .map_err(|e| CheckpointError::io("delete directory", path, e)),
        Ok(_) => fs::remove_file(path)
            .map(|()| true)
            .map_err(|e| CheckpointError::io("delete file", path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CheckpointError::io("inspect", path, e)),
    }
}

/// Replace whatever is at `path` with an empty directory.
pub(crate) fn reset_dir(path: &Path) -> Result<()> {
    remove_if_present(path)?;
    fs::create_dir_all(path).map_err(|e| CheckpointError::io("create directory", path, e))
}

pub(crate) fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| CheckpointError::io("rename", from, e))
}

pub(crate) fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_preserves_nested_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("requests/queue")).unwrap();
        fs::write(src.join("state.json"), b"{\"seen\":3}").unwrap();
        fs::write(src.join("requests/queue/p0"), b"abc").unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();

        let dst = tmp.path().join("dst");
        copy_dir_contents(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("state.json")).unwrap(), b"{\"seen\":3}");
        assert_eq!(fs::read(dst.join("requests/queue/p0")).unwrap(), b"abc");
        assert!(dst.join("empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn copy_keeps_symlinks_as_links() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("target"), b"x").unwrap();
        std::os::unix::fs::symlink("target", src.join("link")).unwrap();

        let dst = tmp.path().join("dst");
        copy_dir_contents(&src, &dst).unwrap();

        let meta = fs::symlink_metadata(dst.join("link")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(dst.join("link")).unwrap(), Path::new("target"));
    }

    #[test]
    fn remove_missing_path_is_noop() {
        let tmp = TempDir::new().unwrap();
        assert!(!remove_if_present(&tmp.path().join("nope")).unwrap());
    }

    #[test]
    fn reset_dir_empties_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("job");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub/f"), b"1").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
