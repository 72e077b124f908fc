//! Error types for the SQLite store.

use seatkey_license::StoreError;
use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A row could not be mapped back into the model.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A registration referenced a license that does not exist.
    #[error("license not found: {0}")]
    MissingLicense(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidData(msg) => StoreError::Corrupt(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
