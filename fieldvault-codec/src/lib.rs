//! Reversible value encoding for FieldVault.
//!
//! Ciphertext is always a string, so non-string values must survive an
//! encrypt/decrypt round trip through a tagged string representation. Two
//! codecs with distinct tagging disciplines cover the two call sites:
//!
//! - [`narrow`] — used for DB-native field transforms. Tags only numbers
//!   (`n:`) and booleans (`b:`); everything else passes through unchanged.
//! - [`wide`] — used for opaque payload encryption. Tags strings (`s:`),
//!   numbers (`n:`), booleans (`b:`), dates (`d:`, RFC 3339) and JSON
//!   trees (`o:`); unsupported input is an error.
//!
//! Both satisfy `decode(encode(v)) == v` for every supported `v`.

pub mod date;
mod error;
pub mod narrow;
pub mod wide;

pub use error::{CodecError, CodecResult};
pub use wide::PlainValue;
