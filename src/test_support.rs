use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// A fresh temporary directory installed as the process working directory.
///
/// The previous working directory is restored on drop, before the temporary
/// directory is removed.
pub(crate) struct ScratchCwd {
    root: PathBuf,
    original: PathBuf,
    _dir: TempDir,
    _lock: MutexGuard<'static, ()>,
}

impl ScratchCwd {
    pub(crate) fn enter() -> Self {
        // The working directory is process-global; tests touching it also run #[serial].
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(&root).unwrap();
        Self {
            root,
            original,
            _dir: dir,
            _lock: lock,
        }
    }

    /// Canonical path of the scratch directory.
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for ScratchCwd {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}
