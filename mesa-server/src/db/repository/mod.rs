//! Repository Module
//!
//! Plain reads and single-record CRUD over the SQLite pool. The
//! multi-row transactional protocols (order creation, checkout) live in
//! [`crate::services`] and reuse the SELECT column lists exported here.

pub mod bill;
pub mod dining_table;
pub mod menu_item;
pub mod order;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && let Some(code) = db_err.code().as_deref().and_then(|c| c.parse::<i64>().ok())
        {
            // SQLite extended result codes carry the primary code in the
            // low byte: SQLITE_BUSY (5) / SQLITE_LOCKED (6) and variants
            // such as SQLITE_BUSY_SNAPSHOT (517) all mean a concurrent
            // transaction holds the lock — retryable from the caller's side
            let primary = code & 0xFF;
            if primary == 5 || primary == 6 {
                return RepoError::Conflict(err.to_string());
            }
            // 2067 = SQLITE_CONSTRAINT_UNIQUE, 1555 = constraint on PK
            if code == 2067 || code == 1555 {
                return RepoError::Conflict(err.to_string());
            }
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
