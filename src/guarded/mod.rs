//! The `GuardedFile` handle.
//!
//! A `GuardedFile` owns one path and a readers-writer lock. Reads take the
//! shared lock; writes, appends, renames, and streaming writers take the
//! exclusive lock. The path lives inside the lock, so a rename swaps it while
//! no other operation on the handle can observe it.
//!
//! A second copy of the path sits behind a small mutex that is only held for
//! the rename syscall itself. [`GuardedFile::path`] and the registry read that
//! copy, so they never queue behind a long-running writer.
//!
//! # Durability
//!
//! Every mutating operation calls `sync_all` before the lock is released, so
//! a reader that acquires the lock next always sees the complete result of
//! the last writer.
//!
//! With [`WriteStrategy::Truncate`] (the default) a whole-file write opens the
//! target with truncate. A failure during the write or the sync can leave the
//! file empty or partially written. [`WriteStrategy::AtomicReplace`] avoids
//! that at the cost of replacing the file's inode on every write.
//!
//! # Scope of the lock
//!
//! The lock is in-process and per handle. Two handles constructed for the same
//! path do not coordinate; share one handle (or go through a
//! [`FileRegistry`](crate::FileRegistry)) to get the guarantees above.
//!
//! The lock is not reentrant. Calling any method other than `path` on a handle
//! from a thread that already holds a [`FileWriter`] for it deadlocks.

mod writer;


pub use writer::FileWriter;

use crate::codec::Format;
use crate::error::{Error, Result};
use crate::fs::{self, RenameOutcome};
use crate::options::{FileOptions, WriteStrategy};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A single file on disk guarded by a readers-writer lock.
#[derive(Debug)]
pub struct GuardedFile {
    path: RwLock<PathBuf>,
    // Lock order: `path` before `location`. Holders of `location` never wait
    // on anything else.
    location: Mutex<PathBuf>,
    options: FileOptions,
}

impl GuardedFile {
    /// Open (creating if absent) `path` with default options.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, FileOptions::default())
    }

    /// Open (creating if absent) `path` with the given options.
    ///
    /// The path is normalized to an absolute form once, here. Existing content
    /// is left untouched. Fails with [`Error::Io`] if the parent directory is
    /// missing or the file cannot be created or opened.
    pub fn with_options<P: AsRef<Path>>(path: P, options: FileOptions) -> Result<Self> {
        options.validate()?;
        let path = fs::normalize(path)?;

        match fs::write_options(options.permission)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => {
                file.sync_all().map_err(|e| Error::io("sync", &path, e))?;
                fs::atomic::sync_parent(&path);
                debug!(path = %path.display(), mode = %format!("{:#o}", options.permission), "created file");
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                ensure_regular_file(&path)?;
                std::fs::File::open(&path).map_err(|e| Error::io("open", &path, e))?;
            }
            Err(e) => return Err(Error::io("create", &path, e)),
        }

        Ok(Self {
            location: Mutex::new(path.clone()),
            path: RwLock::new(path),
            options,
        })
    }

    /// Current path of the file.
    ///
    /// Does not wait for readers or writers; only an in-flight rename holds it
    /// up.
    pub fn path(&self) -> PathBuf {
        self.location.lock().clone()
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    pub fn permission(&self) -> u32 {
        self.options.permission
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> Result<u64> {
        let path = self.path.read();
        std::fs::metadata(&*path)
            .map(|m| m.len())
            .map_err(|e| Error::io("stat", &*path, e))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    // ------------------------------------------------------------------------
    // Reads (shared lock)
    // ------------------------------------------------------------------------

    /// Read the whole file.
    pub fn read(&self) -> Result<Vec<u8>> {
        let path = self.path.read();
        let bytes = std::fs::read(&*path).map_err(|e| Error::io("read", &*path, e))?;
        trace!(path = %path.display(), bytes = bytes.len(), "read file");
        Ok(bytes)
    }

    /// Read the whole file as UTF-8.
    pub fn read_string(&self) -> Result<String> {
        let path = self.path.read();
        std::fs::read_to_string(&*path).map_err(|e| Error::io("read", &*path, e))
    }

    /// Read the whole file and decode it as `T`.
    ///
    /// Decoding happens after the shared lock is released.
    pub fn read_structured<T: DeserializeOwned>(&self, format: Format) -> Result<T> {
        let (bytes, path) = {
            let path = self.path.read();
            let bytes = std::fs::read(&*path).map_err(|e| Error::io("read", &*path, e))?;
            (bytes, path.clone())
        };
        format.decode(&bytes, &path)
    }

    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_structured(Format::Json)
    }

    pub fn read_xml<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_structured(Format::Xml)
    }

    pub fn read_yaml<T: DeserializeOwned>(&self) -> Result<T> {
        self.read_structured(Format::Yaml)
    }

    // ------------------------------------------------------------------------
    // Writes (exclusive lock)
    // ------------------------------------------------------------------------

    /// Replace the file's content with `bytes` and sync it to disk.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path.write();
        match self.options.write_strategy {
            WriteStrategy::Truncate => self.write_in_place(&path, bytes)?,
            WriteStrategy::AtomicReplace => {
                fs::atomic_write(&path, bytes, self.options.permission)?
            }
        }
        debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }

    pub fn write_string(&self, s: &str) -> Result<()> {
        self.write(s.as_bytes())
    }

    /// Encode `value` and write it.
    ///
    /// Encoding completes before the lock is taken; an [`Error::Encode`]
    /// leaves the file untouched.
    pub fn write_structured<T: Serialize + ?Sized>(&self, format: Format, value: &T) -> Result<()> {
        let bytes = format.encode(value)?;
        self.write(&bytes)
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.write_structured(Format::Json, value)
    }

    pub fn write_xml<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.write_structured(Format::Xml, value)
    }

    pub fn write_yaml<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.write_structured(Format::Yaml, value)
    }

    /// Append `bytes` at end of file and sync.
    ///
    /// Concurrent appends on one handle never interleave; their relative order
    /// is whichever acquires the lock first.
    pub fn append(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path.write();
        let mut file = fs::write_options(self.options.permission)
            .append(true)
            .open(&*path)
            .map_err(|e| Error::io("open for append", &*path, e))?;

        file.write_all(bytes)
            .map_err(|e| Error::io("append", &*path, e))?;
        file.sync_all().map_err(|e| Error::io("sync", &*path, e))?;

        trace!(path = %path.display(), bytes = bytes.len(), "appended to file");
        Ok(())
    }

    pub fn append_string(&self, s: &str) -> Result<()> {
        self.append(s.as_bytes())
    }

    /// Truncate the file and return a streaming writer holding the exclusive
    /// lock.
    ///
    /// The lock is held until [`FileWriter::close`] returns or the writer is
    /// dropped. On error no writer exists and the lock is already released.
    pub fn open_writer(&self) -> Result<FileWriter<'_>> {
        let path = self.path.write();
        let file = fs::write_options(self.options.permission)
            .truncate(true)
            .open(&*path)
            .map_err(|e| Error::io("open for writing", &*path, e))?;

        debug!(path = %path.display(), "opened streaming writer");
        Ok(FileWriter::new(path, file))
    }

    /// Rename the file and point this handle at the new path.
    ///
    /// Atomic on a single volume. A cross-device rename fails unless
    /// [`FileOptions::cross_device_rename`] is set, in which case it falls
    /// back to a non-atomic copy and delete. On failure the handle keeps its
    /// old path.
    pub fn rename<P: AsRef<Path>>(&self, new_path: P) -> Result<()> {
        let mut path = self.path.write();
        let new_path = fs::normalize(new_path)?;
        if *path == new_path {
            return Ok(());
        }

        let mut location = self.location.lock();
        let outcome = fs::rename_file(
            &path,
            &new_path,
            self.options.cross_device_rename,
            self.options.permission,
        )?;
        if outcome == RenameOutcome::Copied {
            debug!(from = %path.display(), to = %new_path.display(), "renamed across devices by copy");
        } else {
            debug!(from = %path.display(), to = %new_path.display(), "renamed file");
        }

        location.clone_from(&new_path);
        *path = new_path;
        Ok(())
    }

    fn write_in_place(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = fs::write_options(self.options.permission)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::io("open for writing", path, e))?;

        file.write_all(bytes)
            .map_err(|e| Error::io("write", path, e))?;
        file.sync_all().map_err(|e| Error::io("sync", path, e))
    }
}

/// Construction only accepts regular files (or symlinks to one).
fn ensure_regular_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::io("stat", path, e))?;
    if metadata.is_file() {
        return Ok(());
    }

    let source = if metadata.is_dir() {
        io::Error::new(io::ErrorKind::IsADirectory, "is a directory")
    } else {
        io::Error::new(io::ErrorKind::InvalidInput, "not a regular file")
    };
    Err(Error::io("open", path, source))
}
