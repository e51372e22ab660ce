//! Data key provisioning.
//!
//! A [`KeyProvider`] manages per-collection data keys referenced by an
//! alternate name (the collection name). [`LocalKeyProvider`] keeps data
//! keys wrapped under a master key in memory; remote KMS-backed providers
//! implement the same trait.

use crate::cipher::{self, Algorithm, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, generate_random_key, KdfParams, Salt, SecretKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Handle to a provisioned data key. Key material never leaves the
/// provider through a handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataKeyHandle {
    /// Unique id of the data key.
    pub id: Uuid,
    /// Alternate name the key was provisioned under.
    pub key_alt_name: String,
}

/// Provisions and resolves data keys by alternate name.
///
/// Provisioning happens once at startup per collection; lookups happen on
/// every field transform and must be safe for concurrent invocation.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Provisions a data key under the given alternate name. Idempotent:
    /// if a key already exists under the name, its handle is returned.
    async fn create_data_key(&self, key_alt_name: &str) -> CryptoResult<DataKeyHandle>;

    /// Looks up a provisioned key by alternate name.
    async fn get_key_by_alt_name(&self, key_alt_name: &str) -> CryptoResult<Option<DataKeyHandle>>;

    /// Returns the unwrapped data key for an alternate name.
    async fn data_key(&self, key_alt_name: &str) -> CryptoResult<SecretKey>;
}

struct WrappedDataKey {
    id: Uuid,
    encrypted_key: EncryptedData,
}

/// In-process key provider: data keys wrapped by a master key.
///
/// The master key is supplied directly or derived from a passphrase. The
/// wrapped-key table is read-mostly; a `tokio::sync::RwLock` keeps
/// lookups concurrent.
pub struct LocalKeyProvider {
    master_key: SecretKey,
    keys: RwLock<HashMap<String, WrappedDataKey>>,
}

impl LocalKeyProvider {
    /// Creates a provider from an existing master key.
    pub fn new(master_key: SecretKey) -> Self {
        Self {
            master_key,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a provider with a master key derived from a passphrase.
    pub fn from_passphrase(
        passphrase: &str,
        salt: &Salt,
        params: &KdfParams,
    ) -> CryptoResult<Self> {
        Ok(Self::new(derive_key(passphrase, salt, params)?))
    }
}

#[async_trait]
impl KeyProvider for LocalKeyProvider {
    async fn create_data_key(&self, key_alt_name: &str) -> CryptoResult<DataKeyHandle> {
        let mut keys = self.keys.write().await;
        if let Some(existing) = keys.get(key_alt_name) {
            return Ok(DataKeyHandle {
                id: existing.id,
                key_alt_name: key_alt_name.to_string(),
            });
        }

        let data_key = generate_random_key();
        let encrypted_key = cipher::encrypt(
            &self.master_key,
            data_key.as_bytes(),
            Algorithm::Randomized,
        )?;
        let id = Uuid::now_v7();
        keys.insert(
            key_alt_name.to_string(),
            WrappedDataKey { id, encrypted_key },
        );

        Ok(DataKeyHandle {
            id,
            key_alt_name: key_alt_name.to_string(),
        })
    }

    async fn get_key_by_alt_name(&self, key_alt_name: &str) -> CryptoResult<Option<DataKeyHandle>> {
        let keys = self.keys.read().await;
        Ok(keys.get(key_alt_name).map(|wrapped| DataKeyHandle {
            id: wrapped.id,
            key_alt_name: key_alt_name.to_string(),
        }))
    }

    async fn data_key(&self, key_alt_name: &str) -> CryptoResult<SecretKey> {
        let keys = self.keys.read().await;
        let wrapped = keys
            .get(key_alt_name)
            .ok_or_else(|| CryptoError::KeyNotFound(key_alt_name.to_string()))?;

        let key_bytes = cipher::decrypt(&self.master_key, &wrapped.encrypted_key)?;
        SecretKey::from_slice(&key_bytes)
    }
}
