//! Storage error types for dynlang-storage.
//!
//! [`StorageError`] covers every way a collaborator call can fail:
//! serialization, the SQLite backend, rejected credentials and missing
//! documents.

use thiserror::Error;

/// Errors produced by collaborator calls.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The SQLite backend reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// No language with the given id is stored.
    #[error("language not found: {0}")]
    LanguageNotFound(String),

    /// No model is stored under the given source id.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The connection credentials were rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other collaborator-side failure.
    #[error("provider error: {reason}")]
    Provider { reason: String },
}
