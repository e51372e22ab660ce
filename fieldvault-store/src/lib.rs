//! SQLite document store for FieldVault.
//!
//! The persistence layer that consumes the field engine: every insert
//! and update encrypts configured fields before the row is written, and
//! every read restores typed values through the narrow codec. Callers
//! authorized to see plaintext decrypt explicitly.

mod document_store;
mod error;

pub use document_store::{DocumentStore, Page};
pub use error::{StoreError, StoreResult};
