//! Object database error types.

use crate::id::ObjectId;
use thiserror::Error;

/// Result type for object database operations.
pub type OdbResult<T> = Result<T, OdbError>;

/// Errors that can occur during object database operations.
#[derive(Debug, Error)]
pub enum OdbError {
    /// No object with the given id exists in the store.
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    /// Stored bytes do not rehash to their claimed id.
    #[error("Corrupt object: claimed {claimed}, content hashes to {actual}")]
    Corrupt { claimed: ObjectId, actual: ObjectId },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lock was poisoned (another thread panicked while holding the lock).
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}
