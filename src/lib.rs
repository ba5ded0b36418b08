//! guardfile: concurrency-safe access to a single file.
//!
//! A [`GuardedFile`] wraps one path with an in-process readers-writer lock and
//! exposes whole-file reads and writes (bytes, strings, JSON, XML, YAML),
//! appends, a streaming [`FileWriter`], and renames. Every write is synced to
//! disk before the lock is released.
//!
//! ```no_run
//! use guardfile::{Format, GuardedFile};
//! use std::io::Write;
//!
//! let file = GuardedFile::new("state.json")?;
//! file.write_structured(Format::Json, &vec!["a", "b"])?;
//! let items: Vec<String> = file.read_json()?;
//!
//! let mut writer = file.open_writer()?;
//! writer.write_all(b"streamed")?;
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Locks are not shared across handles or processes. Use one handle per path,
//! or a [`FileRegistry`] to hand out shared handles.

pub mod codec;
pub mod error;
pub mod exit_codes;
pub mod fs;
mod guarded;
pub mod options;
mod registry;

#[cfg(test)]
mod test_support;

pub use codec::Format;
pub use error::{Error, ErrorKind, Result};
pub use guarded::{FileWriter, GuardedFile};
pub use options::{DEFAULT_PERMISSION, FileOptions, WriteStrategy};
pub use registry::FileRegistry;
