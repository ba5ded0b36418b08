//! Atomic whole-file replacement.
//!
//! All atomic writes follow this pattern:
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Rename the temporary file over the target
//! 4. Sync the parent directory so the new entry is persisted (unix)
//!
//! Source and destination share a directory, so the rename never crosses
//! devices. On crash a temporary file named `.{filename}.tmp` may remain.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace the content of `path` with `content`.
///
/// A new file is created with `permission`. Readers of `path` see either the
/// old content or the new content, never a mix.
pub fn atomic_write(path: &Path, content: &[u8], permission: u32) -> Result<()> {
    let temp_path = temp_path_for(path)?;

    write_and_sync(&temp_path, content, permission)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io("replace", path, e)
    })?;

    sync_parent(path);
    Ok(())
}

/// Temporary file path in the same directory as the target.
pub(crate) fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target.file_name().ok_or_else(|| {
        Error::io(
            "replace",
            target,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(filename);
    temp_name.push(".tmp");
    Ok(parent.join(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8], permission: u32) -> Result<()> {
    let mut file = super::write_options(permission)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::io("create temporary file", path, e))?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        Error::io("write temporary file", path, e)
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        Error::io("sync temporary file", path, e)
    })?;

    Ok(())
}

/// Persist the directory entry after a rename. Best effort.
#[cfg(unix)]
pub(crate) fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
pub(crate) fn sync_parent(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        atomic_write(&file_path, b"hello world", 0o600).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "hello world");
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, "original content that is longer").unwrap();

        atomic_write(&file_path, b"new content", 0o600).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_atomic_write_temp_file_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        atomic_write(&file_path, b"content", 0o600).unwrap();

        assert!(!temp_dir.path().join(".test.txt.tmp").exists());
    }

    #[test]
    fn test_atomic_write_missing_parent_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("missing").join("test.txt");

        let err = atomic_write(&file_path, b"content", 0o600).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_temp_path_for() {
        let temp = temp_path_for(Path::new("/some/path/file.txt")).unwrap();
        assert_eq!(temp, PathBuf::from("/some/path/.file.txt.tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_applies_permission() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("mode.txt");

        atomic_write(&file_path, b"x", 0o600).unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
