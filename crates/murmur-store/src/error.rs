//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Block or chain not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A block without an assigned hash cannot be persisted.
    #[error("block has no hash")]
    MissingHash,

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking background task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
