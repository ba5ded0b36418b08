//! Structured formats a [`GuardedFile`](crate::GuardedFile) can read and write.
//!
//! Each format is a pure encode/decode pair over byte buffers. The handle
//! calls them with data it has already read under its lock, or before it takes
//! the lock for a write, so codecs never touch the filesystem.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

/// Supported structured formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    Yaml,
}

impl Format {
    /// Parse a format name (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Xml => "XML",
            Format::Yaml => "YAML",
        }
    }

    /// Serialize `value` into bytes.
    ///
    /// Failures are reported as [`Error::Encode`].
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let encoded = match self {
            Format::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
            Format::Xml => quick_xml::se::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
        };

        encoded.map_err(|message| Error::Encode {
            format: *self,
            message,
        })
    }

    /// Deserialize `bytes` into `T`.
    ///
    /// `origin` names where the bytes came from and is only used in the
    /// [`Error::Decode`] message. A failed decode yields no partial value.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8], origin: &Path) -> Result<T> {
        let decoded = match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            Format::Xml => quick_xml::de::from_reader(bytes).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
        };

        decoded.map_err(|message| Error::Decode {
            format: *self,
            path: origin.to_path_buf(),
            message,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
