//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Check whether a path exists and is a directory.
///
/// A nonexistent path is simply `false`, never an error.
pub fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Check whether a path exists and is a regular file.
pub fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Ensure a directory exists, creating it (and parents) if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| BuildError::DirectoryCreate {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Resolve a possibly-relative path against a root directory.
///
/// Absolute paths pass through untouched. Without a root, resolution
/// falls back to the current working directory.
pub fn try_resolve(path: &Path, root: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match root {
        Some(root) => root.join(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Directory of the running executable.
///
/// This approximates the "project script" location the way a library
/// consumer would see it; callers always probe the working directory
/// as well, so a bare fallback to `.` is acceptable here.
pub fn main_module_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
