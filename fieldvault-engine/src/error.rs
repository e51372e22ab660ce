//! Error types for the field engine.

use fieldvault_crypto::CryptoError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while transforming a document.
///
/// A failure on any single leaf aborts the whole document transform; the
/// caller never receives a partially-transformed document.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Field encryption failed.
    #[error("encryption failed for {collection}.{path}: {source}")]
    Encryption {
        collection: String,
        path: String,
        #[source]
        source: CryptoError,
    },

    /// Field decryption failed.
    #[error("decryption failed at {path}: {source}")]
    Decryption {
        path: String,
        #[source]
        source: CryptoError,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
