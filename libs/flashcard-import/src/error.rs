//! Error types for flashcard-import.

use thiserror::Error;

/// Result type alias using ImportError.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Conditions that abort an import.
///
/// Anything recoverable is reported through
/// [`ImportDiagnostics`](crate::diagnostics::ImportDiagnostics) instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid package container: {0}")]
    InvalidContainer(String),

    #[error("corrupt collection database: {0}")]
    CorruptDatabase(String),

    #[error("package contains no decodable notes")]
    EmptyCollection,
}

impl From<zip::result::ZipError> for ImportError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::InvalidContainer(e.to_string())
    }
}

impl From<crate::db::DbError> for ImportError {
    fn from(e: crate::db::DbError) -> Self {
        Self::CorruptDatabase(e.to_string())
    }
}
