//! Path-keyed sharing of [`GuardedFile`] handles.
//!
//! Handles constructed independently for the same path do not share a lock.
//! A `FileRegistry` closes that gap for callers that agree to go through it:
//! `open` returns the live handle currently at a normalized path, or
//! constructs and registers a new one.
//!
//! The registry holds weak references, so a handle is dropped once its last
//! `Arc` goes. Every `open` first reconciles the map: dead entries are removed
//! and handles renamed since they were registered move to their new path.
//! Reconciling reads each handle's path without touching its file lock, so a
//! long-running writer on one path never stalls `open` of another.

use crate::error::Result;
use crate::fs::normalize;
use crate::guarded::GuardedFile;
use crate::options::FileOptions;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::trace;

type HandleMap = HashMap<PathBuf, Weak<GuardedFile>>;

#[derive(Debug, Default)]
pub struct FileRegistry {
    options: FileOptions,
    handles: Mutex<HandleMap>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose newly constructed handles use `options`.
    pub fn with_options(options: FileOptions) -> Self {
        Self {
            options,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle for `path`.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Arc<GuardedFile>> {
        let key = normalize(path)?;
        let mut handles = self.handles.lock();
        reconcile(&mut handles);

        if let Some(existing) = handles.get(&key).and_then(Weak::upgrade) {
            trace!(path = %key.display(), "reusing registered handle");
            return Ok(existing);
        }

        let handle = Arc::new(GuardedFile::with_options(&key, self.options.clone())?);
        handles.insert(key, Arc::downgrade(&handle));
        Ok(handle)
    }

    /// Drop entries whose handle no longer exists.
    pub fn prune(&self) {
        self.handles
            .lock()
            .retain(|_, handle| handle.strong_count() > 0);
    }

    /// Number of live registered handles.
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .values()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove dead entries and re-key renamed handles under their current path.
///
/// If a renamed handle lands on a path that already has a live handle, the
/// one already registered there keeps the slot.
fn reconcile(handles: &mut HandleMap) {
    let mut moved = Vec::new();
    handles.retain(|key, weak| match weak.upgrade() {
        None => false,
        Some(handle) => {
            let current = handle.path();
            if current == *key {
                true
            } else {
                moved.push((current, Weak::clone(weak)));
                false
            }
        }
    });

    for (current, weak) in moved {
        let occupied = handles
            .get(&current)
            .is_some_and(|existing| existing.strong_count() > 0);
        if !occupied {
            trace!(path = %current.display(), "re-keyed renamed handle");
            handles.insert(current, weak);
        }
    }
}
