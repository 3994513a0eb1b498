//! Store error types.

use thiserror::Error;

/// Errors that can occur while executing statements against the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected or failed the statement.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// The statement did not finish within the configured limit.
    #[error("query timed out after {duration_secs}s")]
    QueryTimeout { duration_secs: u64 },

    /// The blocking worker running the statement panicked or was cancelled.
    #[error("query task failed: {reason}")]
    TaskFailed { reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError {
            reason: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::TaskFailed {
            reason: e.to_string(),
        }
    }
}
