//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("collection has no configuration row")]
    MissingConfig,

    #[error("failed to release database: {0}")]
    Close(String),
}
