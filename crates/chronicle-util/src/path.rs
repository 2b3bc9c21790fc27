//! Repository-relative path normalization.
//!
//! Tracked paths are stored and compared as relative, forward-slash
//! strings (e.g. `src/main.rs`). Normalization rejects anything that
//! could escape the repository root.

use std::path::{Component, Path};
use thiserror::Error;

/// Errors produced by path normalization.
#[derive(Debug, Error)]
pub enum PathError {
    /// Path is absolute; tracked paths must be repository-relative.
    #[error("Path must be relative: {0}")]
    Absolute(String),

    /// Path contains `..` or other traversal components.
    #[error("Path escapes repository root: {0}")]
    Traversal(String),

    /// Path is empty or normalizes to nothing.
    #[error("Path is empty")]
    Empty,
}

/// Normalize a tracked path to a repository-relative string.
///
/// - Strips `./` prefixes
/// - Converts separators to `/`
/// - Rejects absolute paths, `..` components, and empty paths
pub fn normalize(path: &Path) -> Result<String, PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                // Backslash is a valid byte in unix file names but is
                // a separator everywhere else; reject it outright.
                Some(s) if !s.is_empty() && !s.contains('\\') => parts.push(s),
                _ => return Err(PathError::Traversal(path.display().to_string())),
            },
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PathError::Traversal(path.display().to_string()))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(path.display().to_string()))
            }
        }
    }

    if parts.is_empty() {
        return Err(PathError::Empty);
    }

    Ok(parts.join("/"))
}
