//! Error types for guardfile.
//!
//! Uses thiserror for derive macros. Every fallible operation on a
//! [`GuardedFile`](crate::GuardedFile) returns one of these values; nothing is
//! logged or retried on the way out.

use crate::codec::Format;
use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for guardfile operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The filesystem layer failed (missing file, permission denied, disk full,
    /// cross-device rename, sync failure).
    #[error("failed to {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value could not be serialized. The file was not touched.
    #[error("failed to encode {format}: {message}")]
    Encode { format: Format, message: String },

    /// File bytes could not be parsed into the requested shape.
    #[error("failed to decode {format} from '{}': {message}", path.display())]
    Decode {
        format: Format,
        path: PathBuf,
        message: String,
    },

    /// Invalid [`FileOptions`](crate::FileOptions).
    #[error("invalid options: {0}")]
    Config(String),

    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Encode,
    Decode,
    Config,
    Usage,
}

impl Error {
    /// Wrap an I/O failure of `op` on `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::Io,
            Error::Encode { .. } => ErrorKind::Encode,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Config(_) => ErrorKind::Config,
            Error::Usage(_) => ErrorKind::Usage,
        }
    }

    /// Returns the CLI exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage | ErrorKind::Config => exit_codes::USER_ERROR,
            ErrorKind::Io => exit_codes::IO_FAILURE,
            ErrorKind::Encode | ErrorKind::Decode => exit_codes::CODEC_FAILURE,
        }
    }
}

/// Result type alias for guardfile operations.
pub type Result<T> = std::result::Result<T, Error>;
