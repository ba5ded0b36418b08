//! Filesystem primitives used by [`GuardedFile`](crate::GuardedFile).
//!
//! Nothing in here takes a lock. Callers hold the handle's lock around every
//! call, and every function that writes syncs to disk before returning.

pub mod atomic;
mod path;
mod rename;

pub use atomic::atomic_write;
pub use path::normalize;
pub use rename::{RenameOutcome, rename_file};

use std::fs::OpenOptions;

/// `OpenOptions` for writing, creating the file with `permission` if absent.
///
/// The mode only takes effect on creation; existing files keep their mode.
pub(crate) fn write_options(permission: u32) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    apply_mode(&mut options, permission);
    options
}

#[cfg(unix)]
fn apply_mode(options: &mut OpenOptions, permission: u32) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(permission);
}

#[cfg(not(unix))]
fn apply_mode(_options: &mut OpenOptions, _permission: u32) {}
