//! History error types.

use sentencify_storage::StorageError;
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors surfaced by the fallible `try_*` history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The per-topic lock table was poisoned.
    #[error("Topic lock poisoned: {0}")]
    LockPoisoned(String),
}
