//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// No data key is provisioned under the given alternate name.
    #[error("no data key for alt name: {0}")]
    KeyNotFound(String),

    /// A ciphertext string is malformed or carries no recognized marker.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Value encoding failed before encryption or after decryption.
    #[error("codec error: {0}")]
    Codec(#[from] fieldvault_codec::CodecError),
}
