//! Per-handle options.
//!
//! `FileOptions` can be built in code or loaded from YAML. Unknown fields are
//! ignored and every field has a default, so an empty document is valid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Owner read/write only.
pub const DEFAULT_PERMISSION: u32 = 0o600;

/// How whole-file writes replace the existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Open with create+truncate, write, fsync (default).
    ///
    /// A failure during the write or sync can leave the file empty or partial.
    #[default]
    Truncate,
    /// Write a sibling temp file, fsync it, then rename it over the target.
    AtomicReplace,
}

impl WriteStrategy {
    /// Parse a write strategy from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "truncate" => Some(Self::Truncate),
            "atomic_replace" => Some(Self::AtomicReplace),
            _ => None,
        }
    }
}

/// Options attached to a [`GuardedFile`](crate::GuardedFile) at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    /// POSIX mode bits used whenever a write may create the file.
    pub permission: u32,

    /// Strategy for `write`, `write_string`, and `write_structured`.
    pub write_strategy: WriteStrategy,

    /// Fall back to copy+delete when a rename crosses devices.
    ///
    /// The fallback is not atomic.
    pub cross_device_rename: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            permission: DEFAULT_PERMISSION,
            write_strategy: WriteStrategy::default(),
            cross_device_rename: false,
        }
    }
}

impl FileOptions {
    pub fn with_permission(mut self, permission: u32) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_write_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    pub fn with_cross_device_rename(mut self, enabled: bool) -> Self {
        self.cross_device_rename = enabled;
        self
    }

    /// Load options from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io("read options file", path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string and validate them.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: FileOptions = if yaml.trim().is_empty() {
            FileOptions::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| Error::Config(format!("failed to parse options YAML: {}", e)))?
        };

        options.validate()?;
        Ok(options)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("failed to serialize options to YAML: {}", e)))
    }

    /// Validation rules:
    /// - `permission` fits in the 12 mode bits (`0o7777`)
    /// - `permission` grants the owner read and write, since every handle must
    ///   be able to reopen its own file
    pub fn validate(&self) -> Result<()> {
        if self.permission > 0o7777 {
            return Err(Error::Config(format!(
                "permission {:#o} exceeds 0o7777",
                self.permission
            )));
        }

        if self.permission & 0o600 != 0o600 {
            return Err(Error::Config(format!(
                "permission {:#o} must include owner read and write (0o600)",
                self.permission
            )));
        }

        Ok(())
    }
}
