//! Error types for the document store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Field encryption/decryption error.
    #[error("encryption error: {0}")]
    Encryption(#[from] fieldvault_engine::EngineError),

    /// A stored document is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}
