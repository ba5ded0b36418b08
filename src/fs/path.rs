//! Lexical path normalization.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute and strip `.` and `..` components.
///
/// This is purely lexical: symlinks are not resolved and the path does not
/// need to exist. `..` at the root stays at the root.
pub fn normalize<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::io(
            "resolve",
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty path"),
        ));
    }

    let absolute = std::path::absolute(path).map_err(|e| Error::io("resolve", path, e))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    Ok(normalized)
}
