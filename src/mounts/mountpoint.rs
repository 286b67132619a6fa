//! Mount-point directory lifecycle.
//!
//! Mount points are plain local directories. Before mounting, the target is
//! created if missing and must otherwise be an empty directory; after a
//! successful unmount, the directory is removed again. Anything unexpected
//! (a file in the way, leftover content) is a conflict, never something to
//! delete silently.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SshfsmountError};

/// Expand `~` and resolve to an absolute path, canonicalizing when the path
/// exists so comparisons survive symlinks and trailing slashes.
pub(crate) fn absolutize(path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    let path = Path::new(expanded.as_ref());

    match fs::canonicalize(path) {
        Ok(abs) => abs,
        Err(_) => {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        }
    }
}

fn dir_is_empty(path: &Path) -> Result<bool> {
    Ok(path.read_dir()?.next().is_none())
}

/// Create or validate the mount-point directory, returning its absolute
/// path.
///
/// A missing directory is created (with parents). An existing path must be
/// an empty directory; anything else refuses with a conflict so we never
/// mount on top of user data.
pub fn prepare_mount_point(path: &str) -> Result<PathBuf> {
    let local = absolutize(path);

    if !local.exists() {
        tracing::info!("Creating mount-point directory {}", local.display());
        fs::create_dir_all(&local)?;
        return Ok(fs::canonicalize(&local).unwrap_or(local));
    }

    if !local.is_dir() {
        return Err(SshfsmountError::Conflict(format!(
            "Mount point {} already exists and is not a directory",
            local.display()
        )));
    }

    if !dir_is_empty(&local)? {
        return Err(SshfsmountError::Conflict(format!(
            "Mount point {} already exists and is not empty",
            local.display()
        )));
    }

    tracing::debug!(
        "Mount-point directory {} already exists and is empty",
        local.display()
    );
    Ok(local)
}

/// Remove the mount-point directory after a successful unmount.
///
/// Returns whether a directory was actually removed. A missing directory is
/// a no-op; a non-empty one means the unmount left stale content (or
/// something else wrote there) and is a conflict, not a deletion target.
pub fn remove_mount_point(path: &str) -> Result<bool> {
    let local = absolutize(path);

    if !local.exists() {
        tracing::debug!("Mount-point directory {} not found", local.display());
        return Ok(false);
    }

    if !local.is_dir() {
        return Err(SshfsmountError::Conflict(format!(
            "Mount point {} is not a directory",
            local.display()
        )));
    }

    if !dir_is_empty(&local)? {
        return Err(SshfsmountError::Conflict(format!(
            "Mount-point directory {} is not empty",
            local.display()
        )));
    }

    tracing::info!("Deleting mount-point directory {}", local.display());
    fs::remove_dir(&local)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_creates_missing_directory() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("mnt").join("work");

        let local = prepare_mount_point(target.to_str().unwrap()).unwrap();
        assert!(local.is_absolute());
        assert!(local.is_dir());

        // Second call sees an existing empty directory and succeeds.
        let again = prepare_mount_point(target.to_str().unwrap()).unwrap();
        assert_eq!(again, local);
    }

    #[test]
    fn prepare_rejects_existing_file() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("work");
        fs::write(&target, "data").unwrap();

        let err = prepare_mount_point(target.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SshfsmountError::Conflict(_)));
        assert!(target.is_file());
    }

    #[test]
    fn prepare_rejects_non_empty_directory() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("work");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "data").unwrap();

        let err = prepare_mount_point(target.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SshfsmountError::Conflict(_)));
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn remove_missing_directory_is_a_noop() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("gone");

        assert!(!remove_mount_point(target.to_str().unwrap()).unwrap());
    }

    #[test]
    fn remove_rejects_file() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("work");
        fs::write(&target, "data").unwrap();

        let err = remove_mount_point(target.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SshfsmountError::Conflict(_)));
        assert!(target.is_file());
    }

    #[test]
    fn remove_rejects_non_empty_directory() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("work");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("stale.txt"), "data").unwrap();

        let err = remove_mount_point(target.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SshfsmountError::Conflict(_)));
        assert!(target.join("stale.txt").exists());
    }

    #[test]
    fn remove_deletes_empty_directory() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("work");
        fs::create_dir(&target).unwrap();

        assert!(remove_mount_point(target.to_str().unwrap()).unwrap());
        assert!(!target.exists());
    }

    #[test]
    fn absolutize_resolves_relative_paths() {
        assert!(absolutize("some/relative/mnt").is_absolute());
        assert!(absolutize("~/mnt/work").is_absolute());
    }
}
