//! Symmetric encryption using ChaCha20-Poly1305.
//!
//! Provides authenticated encryption with two nonce disciplines: random
//! (equal plaintexts diverge) and deterministic (equal plaintexts under
//! the same key collide, enabling equality lookups over ciphertext).

use crate::error::{CryptoError, CryptoResult};
use crate::key::SecretKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Supported envelope-encryption algorithms for field values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Fresh random nonce per encryption.
    Randomized,
    /// Nonce derived from key and plaintext; the same plaintext under the
    /// same key always yields the same ciphertext.
    Deterministic,
}

/// Encrypted data with metadata needed for decryption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The nonce used for encryption.
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Returns the total size of the encrypted data.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes to base64 for storage/transmission.
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(&bytes)
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {}", e)))?;

        if bytes.len() < NONCE_SIZE {
            return Err(CryptoError::Decryption("data too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

/// Encrypts plaintext under the given nonce discipline.
pub fn encrypt(
    key: &SecretKey,
    plaintext: &[u8],
    algorithm: Algorithm,
) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let nonce_bytes = match algorithm {
        Algorithm::Randomized => {
            let mut bytes = [0u8; NONCE_SIZE];
            rand::rngs::OsRng.fill_bytes(&mut bytes);
            bytes
        }
        Algorithm::Deterministic => derive_nonce(key, plaintext),
    };
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts ciphertext produced by [`encrypt`] (either discipline).
pub fn decrypt(key: &SecretKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&encrypted.nonce);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}

/// Encrypts a string and returns the base64-encoded result.
pub fn encrypt_string(
    key: &SecretKey,
    plaintext: &str,
    algorithm: Algorithm,
) -> CryptoResult<String> {
    let encrypted = encrypt(key, plaintext.as_bytes(), algorithm)?;
    Ok(encrypted.to_base64())
}

/// Decrypts a base64-encoded string.
pub fn decrypt_string(key: &SecretKey, encoded: &str) -> CryptoResult<String> {
    let encrypted = EncryptedData::from_base64(encoded)?;
    let plaintext = decrypt(key, &encrypted)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {}", e)))
}

// Deterministic nonces are the truncated SHA-256 of key || plaintext, so
// a nonce never repeats across distinct (key, plaintext) pairs.
fn derive_nonce(key: &SecretKey, plaintext: &[u8]) -> [u8; NONCE_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(plaintext);
    let digest = hasher.finalize();

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&digest[..NONCE_SIZE]);
    nonce
}
