//! Envelope encryption for FieldVault.
//!
//! Field values are encrypted with per-collection data keys that are
//! themselves wrapped by a master key (envelope encryption). Data keys are
//! provisioned through a [`KeyProvider`] under an alternate name equal to
//! the collection name, once at startup, never per request.
//!
//! The engine consumes this crate through the [`FieldCipher`] trait so it
//! never sees raw key material; tests can substitute
//! [`PassthroughFieldCipher`] for zero-overhead operation.

mod cipher;
mod error;
mod field_cipher;
mod key;
mod payload;
mod provider;

pub use cipher::{
    decrypt, decrypt_string, encrypt, encrypt_string, Algorithm, EncryptedData, NONCE_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use field_cipher::{
    EnvelopeCipher, FieldCipher, FieldCiphertext, PassthroughFieldCipher, CIPHERTEXT_MARKER,
};
pub use key::{derive_key, generate_random_key, KdfParams, Salt, SecretKey, KEY_SIZE, SALT_SIZE};
pub use payload::{decrypt_payload, encrypt_payload};
pub use provider::{DataKeyHandle, KeyProvider, LocalKeyProvider};
