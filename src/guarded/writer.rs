//! Streaming writer that owns a handle's exclusive lock.

use crate::error::{Error, Result};
use parking_lot::RwLockWriteGuard;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive, buffered writer returned by
/// [`GuardedFile::open_writer`](super::GuardedFile::open_writer).
///
/// Bytes are written to the stream in call order. [`close`](Self::close)
/// flushes, syncs to disk, closes the OS file, and only then releases the
/// lock.
///
/// Dropping a writer without closing it still flushes, syncs, and releases
/// the lock, but any error on that path is only logged. Call `close` to see
/// it.
pub struct FileWriter<'a> {
    stream: Option<BufWriter<File>>,
    guard: Option<RwLockWriteGuard<'a, PathBuf>>,
    written: u64,
}

impl<'a> FileWriter<'a> {
    pub(super) fn new(guard: RwLockWriteGuard<'a, PathBuf>, file: File) -> Self {
        Self {
            stream: Some(BufWriter::new(file)),
            guard: Some(guard),
            written: 0,
        }
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        self.guard.as_deref().map(PathBuf::as_path).unwrap_or(Path::new(""))
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush, sync, close the file, then release the lock.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        let path = self.path().to_path_buf();

        let result = stream
            .flush()
            .map_err(|e| Error::io("flush", &path, e))
            .and_then(|()| {
                stream
                    .get_ref()
                    .sync_all()
                    .map_err(|e| Error::io("sync", &path, e))
            });

        // Close the OS file before the lock goes.
        drop(stream);
        self.guard.take();

        if result.is_ok() {
            debug!(path = %path.display(), bytes = self.written, "closed streaming writer");
        }
        result
    }
}

impl Write for FileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::other("writer already closed"))?;
        let n = stream.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    /// Pushes buffered bytes to the OS without syncing; `close` syncs.
    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for FileWriter<'_> {
    fn drop(&mut self) {
        if self.stream.is_none() {
            return;
        }
        warn!(path = %self.path().display(), "streaming writer dropped without close");
        if let Err(e) = self.finish() {
            warn!(error = %e, "failed to finish dropped streaming writer");
        }
    }
}

impl std::fmt::Debug for FileWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.path())
            .field("written", &self.written)
            .field("open", &self.stream.is_some())
            .finish()
    }
}
