//! Engine error types.

use chronicle_odb::{ObjectId, OdbError};
use chronicle_util::PathError;
use thiserror::Error;

/// Result type for engine operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Errors surfaced by the versioning engine.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// No commit with the given id.
    #[error("Commit not found: {0}")]
    CommitNotFound(ObjectId),

    /// The path does not exist in the referenced snapshot.
    #[error("Path not found in commit {commit}: {path}")]
    PathNotFound { commit: ObjectId, path: String },

    /// A save was attempted with no delta against HEAD.
    #[error("Nothing to change: {0}")]
    NothingToChange(String),

    /// The HEAD reference is unreadable or points nowhere.
    #[error("Invalid HEAD reference: {0}")]
    InvalidHead(String),

    /// Tracked path failed normalization.
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Disk read/write failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Object database failure (not found, corrupt object, store IO).
    #[error(transparent)]
    Odb(#[from] OdbError),
}

impl TimelineError {
    /// Whether this is the benign "no delta to save" case.
    pub fn is_nothing_to_change(&self) -> bool {
        matches!(self, TimelineError::NothingToChange(_))
    }
}
