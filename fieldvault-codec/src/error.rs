//! Error types for the codec layer.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The wide codec has no tag for this value.
    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),

    /// The payload after a type tag is not a valid instance of that type.
    #[error("invalid {expected} payload: {payload}")]
    InvalidPayload {
        expected: &'static str,
        payload: String,
    },

    /// The payload after an `o:` tag is not valid JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The input carries a tag the wide codec does not recognize.
    #[error("unrecognized type tag: {0}")]
    UnknownTag(String),
}
