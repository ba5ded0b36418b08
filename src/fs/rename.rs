//! File rename with an opt-in cross-device fallback.
//!
//! On POSIX filesystems a same-volume rename is an atomic `rename(2)`. When
//! source and destination sit on different devices the OS reports `EXDEV`.
//! By default that surfaces as an error. With the fallback enabled, the file is
//! copied (synced) to the destination and the source is deleted; a crash
//! between those steps can leave both files, so the fallback is not atomic.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

/// How a successful rename was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// A single atomic `rename`.
    Renamed,
    /// Copy to destination followed by delete of source.
    Copied,
}

/// Rename `source` to `destination`.
///
/// The destination's parent directory must already exist.
pub fn rename_file(
    source: &Path,
    destination: &Path,
    cross_device_fallback: bool,
    permission: u32,
) -> Result<RenameOutcome> {
    match fs::rename(source, destination) {
        Ok(()) => {
            super::atomic::sync_parent(destination);
            Ok(RenameOutcome::Renamed)
        }
        Err(e) if cross_device_fallback && is_cross_device_rename(&e) => {
            copy_then_delete(source, destination, permission, e)?;
            Ok(RenameOutcome::Copied)
        }
        Err(e) => Err(Error::io("rename", source, e)),
    }
}

fn copy_then_delete(
    source: &Path,
    destination: &Path,
    permission: u32,
    original_error: io::Error,
) -> Result<()> {
    let content = fs::read(source).map_err(|e| {
        Error::io(
            "read for cross-device rename",
            source,
            io::Error::new(
                e.kind(),
                format!("{} (original rename error: {})", e, original_error),
            ),
        )
    })?;

    super::atomic_write(destination, &content, permission)?;

    fs::remove_file(source).map_err(|e| Error::io("remove source after cross-device copy", source, e))
}

fn is_cross_device_rename(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || is_exdev(err)
}

// 18 is EXDEV on unix; other platforms reuse the number for unrelated errors.
#[cfg(unix)]
fn is_exdev(err: &io::Error) -> bool {
    err.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_exdev(_err: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rename_file_moves_within_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        let destination = temp.path().join("b.txt");
        fs::write(&source, b"hello").unwrap();

        let outcome = rename_file(&source, &destination, false, 0o600).unwrap();

        assert_eq!(outcome, RenameOutcome::Renamed);
        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"hello");
    }

    #[test]
    fn rename_file_replaces_existing_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.txt");
        let destination = temp.path().join("destination.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&destination, b"old").unwrap();

        rename_file(&source, &destination, false, 0o600).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"new");
    }

    #[test]
    fn rename_file_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, b"stay").unwrap();

        let err = rename_file(&source, &temp.path().join("nope/b.txt"), true, 0o600).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert_eq!(fs::read(&source).unwrap(), b"stay");
    }

    #[cfg(unix)]
    #[test]
    fn exdev_is_recognized() {
        assert!(is_cross_device_rename(&io::Error::from_raw_os_error(18)));
    }

    #[test]
    fn crosses_devices_kind_is_recognized() {
        assert!(is_cross_device_rename(&io::Error::from(
            io::ErrorKind::CrossesDevices
        )));
        assert!(!is_cross_device_rename(&io::Error::from(
            io::ErrorKind::NotFound
        )));
    }

    #[cfg(windows)]
    #[test]
    fn windows_error_18_is_not_cross_device() {
        // ERROR_NO_MORE_FILES
        assert!(!is_cross_device_rename(&io::Error::from_raw_os_error(18)));
    }

    #[test]
    fn copy_then_delete_moves_content() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        let destination = temp.path().join("b.txt");
        fs::write(&source, b"payload").unwrap();

        copy_then_delete(
            &source,
            &destination,
            0o600,
            io::Error::from_raw_os_error(18),
        )
        .unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"payload");
    }
}
