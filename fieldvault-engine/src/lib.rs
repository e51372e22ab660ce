//! Field-level document encryption and masking for FieldVault.
//!
//! A configuration-driven engine that sits inside the database access
//! layer: it selectively encrypts, decrypts, and masks individual
//! document fields — nested objects, arrays, and wildcard paths —
//! transparently around CRUD operations, while preserving originals for
//! audit under `original_attributes`.
//!
//! # Architecture
//!
//! - [`path`] resolves dotted, possibly-wildcarded field paths against
//!   concrete documents
//! - [`walk`] descends nested values and transforms every leaf
//! - [`FieldEngine`] orchestrates per-collection field selection,
//!   encryption, decryption, and masking through an injected
//!   [`fieldvault_crypto::FieldCipher`]
//! - [`EncryptionConfig`] is the static per-collection rule table,
//!   loaded once at startup

mod config;
mod engine;
mod error;
mod mask;
pub mod path;
pub mod walk;

pub use config::{CollectionRule, EncryptionConfig, EngineSettings};
pub use engine::{FieldEngine, DATA_MASKING_REQUIRED, ORIGINAL_ATTRIBUTES};
pub use error::{EngineError, EngineResult};
pub use mask::mask_value;
