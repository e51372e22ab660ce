//! Field-value encryption interface.
//!
//! The document engine depends on `Arc<dyn FieldCipher>` — it never sees
//! raw keys. [`EnvelopeCipher`] is the production implementation on top of
//! a [`KeyProvider`]; tests use [`PassthroughFieldCipher`].

use crate::cipher::{self, Algorithm, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::provider::KeyProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Marker prefix identifying a field ciphertext string inside a document.
pub const CIPHERTEXT_MARKER: &str = "$fv1$";

/// Self-describing field ciphertext: the key reference travels with the
/// payload so decryption needs no out-of-band collection name.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldCiphertext {
    /// Alternate name of the data key (the collection name).
    pub key_ref: String,
    /// Nonce and encrypted payload.
    pub data: EncryptedData,
}

impl FieldCiphertext {
    /// Returns true when a string carries the ciphertext marker.
    pub fn is_marked(s: &str) -> bool {
        s.starts_with(CIPHERTEXT_MARKER)
    }

    /// Renders to the marked text form `$fv1$<keyref>$<base64>` so the
    /// ciphertext can live inside a JSON document.
    pub fn to_marked_string(&self) -> String {
        format!(
            "{}{}${}",
            CIPHERTEXT_MARKER,
            self.key_ref,
            self.data.to_base64()
        )
    }

    /// Parses the marked text form.
    pub fn from_marked_string(s: &str) -> CryptoResult<Self> {
        let rest = s
            .strip_prefix(CIPHERTEXT_MARKER)
            .ok_or_else(|| CryptoError::InvalidCiphertext("missing marker".to_string()))?;
        let (key_ref, payload) = rest
            .split_once('$')
            .ok_or_else(|| CryptoError::InvalidCiphertext("missing key reference".to_string()))?;
        if key_ref.is_empty() {
            return Err(CryptoError::InvalidCiphertext(
                "empty key reference".to_string(),
            ));
        }
        Ok(Self {
            key_ref: key_ref.to_string(),
            data: EncryptedData::from_base64(payload)?,
        })
    }
}

/// Encrypts and decrypts individual field values.
///
/// Implementations own the key resolution. Calls suspend (key lookup may
/// hit a remote provider) and must be safe for concurrent invocation.
#[async_trait]
pub trait FieldCipher: Send + Sync {
    /// Encrypts an encoded field value under the key referenced by
    /// `key_ref`, with the given nonce discipline.
    async fn encrypt(
        &self,
        plaintext: &str,
        key_ref: &str,
        algorithm: Algorithm,
    ) -> CryptoResult<FieldCiphertext>;

    /// Decrypts a ciphertext previously produced by `encrypt`.
    async fn decrypt(&self, ciphertext: &FieldCiphertext) -> CryptoResult<String>;
}

/// Production field cipher: envelope encryption through a key provider.
pub struct EnvelopeCipher {
    provider: Arc<dyn KeyProvider>,
}

impl EnvelopeCipher {
    /// Creates an envelope cipher over the given provider.
    pub fn new(provider: Arc<dyn KeyProvider>) -> Self {
        Self { provider }
    }

    /// Ensures a data key exists for every listed collection. Called once
    /// at startup, before any field transform.
    pub async fn provision<I, S>(&self, collections: I) -> CryptoResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for collection in collections {
            let name = collection.as_ref();
            if self.provider.get_key_by_alt_name(name).await?.is_none() {
                self.provider.create_data_key(name).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FieldCipher for EnvelopeCipher {
    async fn encrypt(
        &self,
        plaintext: &str,
        key_ref: &str,
        algorithm: Algorithm,
    ) -> CryptoResult<FieldCiphertext> {
        let key = self.provider.data_key(key_ref).await?;
        let data = cipher::encrypt(&key, plaintext.as_bytes(), algorithm)?;
        Ok(FieldCiphertext {
            key_ref: key_ref.to_string(),
            data,
        })
    }

    async fn decrypt(&self, ciphertext: &FieldCiphertext) -> CryptoResult<String> {
        let key = self.provider.data_key(&ciphertext.key_ref).await?;
        let plaintext = cipher::decrypt(&key, &ciphertext.data)?;
        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {}", e)))
    }
}

/// No-op field cipher for tests: the "ciphertext" is the plaintext bytes.
pub struct PassthroughFieldCipher;

#[async_trait]
impl FieldCipher for PassthroughFieldCipher {
    async fn encrypt(
        &self,
        plaintext: &str,
        key_ref: &str,
        _algorithm: Algorithm,
    ) -> CryptoResult<FieldCiphertext> {
        Ok(FieldCiphertext {
            key_ref: key_ref.to_string(),
            data: EncryptedData {
                nonce: [0u8; cipher::NONCE_SIZE],
                ciphertext: plaintext.as_bytes().to_vec(),
            },
        })
    }

    async fn decrypt(&self, ciphertext: &FieldCiphertext) -> CryptoResult<String> {
        String::from_utf8(ciphertext.data.ciphertext.clone())
            .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {}", e)))
    }
}
