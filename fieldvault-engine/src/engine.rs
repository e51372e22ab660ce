//! The field encryption/decryption engine.
//!
//! A CRUD write calls [`FieldEngine::encrypt`] before persistence; a
//! read calls [`FieldEngine::decrypt`] on each retrieved document. The
//! engine consults the per-collection configuration, expands wildcarded
//! field paths against the concrete document, walks nested values to
//! their leaves, and transforms each leaf through the narrow codec and
//! the injected [`FieldCipher`].
//!
//! Sibling field transforms are dispatched concurrently and awaited
//! together; writes are applied only after the join succeeds, so a
//! single leaf failure aborts the whole document transform without
//! publishing partial results.

use crate::config::{CollectionRule, EncryptionConfig, EngineSettings};
use crate::error::{EngineError, EngineResult};
use crate::mask::mask_value;
use crate::path::{self, FieldPath, Segment};
use crate::walk;
use fieldvault_codec::narrow;
use fieldvault_crypto::{FieldCipher, FieldCiphertext};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Reserved top-level field holding pre-mask values for audit.
pub const ORIGINAL_ATTRIBUTES: &str = "original_attributes";

/// Document flag requesting masking in addition to encryption.
pub const DATA_MASKING_REQUIRED: &str = "data_masking_required";

/// Primary key field, never walked in either direction.
const ID_FIELD: &str = "_id";

/// Configuration-driven field encryption and masking.
///
/// Pure per-call transform: no state beyond the immutable configuration
/// table and the injected cipher.
pub struct FieldEngine {
    settings: EngineSettings,
    config: EncryptionConfig,
    cipher: Arc<dyn FieldCipher>,
}

impl FieldEngine {
    /// Creates an engine over the given settings, configuration table,
    /// and cipher.
    pub fn new(
        settings: EngineSettings,
        config: EncryptionConfig,
        cipher: Arc<dyn FieldCipher>,
    ) -> Self {
        Self {
            settings,
            config,
            cipher,
        }
    }

    /// Returns the configuration table.
    pub fn config(&self) -> &EncryptionConfig {
        &self.config
    }

    /// Encrypts the configured fields of a document, returning the
    /// transformed copy. Identity (modulo cloning) when encryption is
    /// disabled or the collection has no configuration entry.
    ///
    /// When the document carries a true `data_masking_required` flag,
    /// each encrypted field is archived under `original_attributes` and
    /// its display position is overwritten with a mask. Fields already
    /// archived are not reprocessed, so a second pass over an
    /// already-masked document is a no-op for those fields.
    pub async fn encrypt(&self, collection: &str, document: &Value) -> EngineResult<Value> {
        if !self.settings.enabled {
            return Ok(document.clone());
        }
        let Some(rule) = self.config.rule(collection) else {
            debug!(collection, "collection not configured, skipping encryption");
            return Ok(document.clone());
        };

        let mut source = document.clone();
        strip_id(&mut source);
        let mut result = document.clone();

        let mut fields = expand_fields(rule, &source);
        fields.retain(|field| !path::has_path(&result, &field.prefixed_with(ORIGINAL_ATTRIBUTES)));

        debug!(collection, fields = fields.len(), "encrypting document");

        let mut tasks = Vec::with_capacity(fields.len());
        for field in &fields {
            tasks.push(self.encrypt_field(collection, field, &source));
        }
        let encrypted = try_join_all(tasks).await?;

        let masking = document
            .get(DATA_MASKING_REQUIRED)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        for (field, encrypted_value) in fields.iter().zip(encrypted) {
            let Some(encrypted_value) = encrypted_value else {
                continue;
            };
            path::set_path(&mut result, field, encrypted_value);
            if masking {
                mask_field(field, &source, &mut result);
            }
        }

        Ok(result)
    }

    /// Decrypts the configured fields of a document, returning it with
    /// plaintext restored in place. Leaves that carry no ciphertext
    /// marker pass through unchanged; there is no masking on this side.
    pub async fn decrypt(&self, collection: &str, mut document: Value) -> EngineResult<Value> {
        if !self.settings.enabled {
            return Ok(document);
        }
        let Some(rule) = self.config.rule(collection) else {
            debug!(collection, "collection not configured, skipping decryption");
            return Ok(document);
        };

        let mut source = document.clone();
        strip_id(&mut source);

        let fields = expand_fields(rule, &source);

        debug!(collection, fields = fields.len(), "decrypting document");

        let mut tasks = Vec::with_capacity(fields.len());
        for field in &fields {
            tasks.push(self.decrypt_field(field, &source));
        }
        let decrypted = try_join_all(tasks).await?;

        for (field, decrypted_value) in fields.iter().zip(decrypted) {
            if let Some(decrypted_value) = decrypted_value {
                path::set_path(&mut document, field, decrypted_value);
            }
        }

        Ok(document)
    }

    /// Encrypts a single value under the collection's key. Identity when
    /// encryption is disabled or the collection is unconfigured.
    pub async fn encrypt_value(&self, collection: &str, value: &Value) -> EngineResult<Value> {
        if !self.settings.enabled || self.config.rule(collection).is_none() || value.is_null() {
            return Ok(value.clone());
        }
        self.encrypt_leaf(collection, FieldPath::root(), value.clone())
            .await
    }

    /// Decrypts a single value. Identity when encryption is disabled,
    /// the collection is unconfigured, or the value carries no
    /// ciphertext marker.
    pub async fn decrypt_value(&self, collection: &str, value: &Value) -> EngineResult<Value> {
        if !self.settings.enabled || self.config.rule(collection).is_none() {
            return Ok(value.clone());
        }
        self.decrypt_leaf(FieldPath::root(), value.clone()).await
    }

    async fn encrypt_field(
        &self,
        collection: &str,
        field: &FieldPath,
        source: &Value,
    ) -> EngineResult<Option<Value>> {
        let Some(value) = path::get_path(source, field) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }

        if value.is_object() || value.is_array() {
            let mut subtree = value.clone();
            walk::transform_leaves(&mut subtree, &FieldPath::root(), |leaf_path, leaf| {
                self.encrypt_leaf(collection, field.join(&leaf_path), leaf)
            })
            .await?;
            Ok(Some(subtree))
        } else {
            let encrypted = self
                .encrypt_leaf(collection, field.clone(), value.clone())
                .await?;
            Ok(Some(encrypted))
        }
    }

    async fn decrypt_field(&self, field: &FieldPath, source: &Value) -> EngineResult<Option<Value>> {
        let Some(value) = path::get_path(source, field) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }

        if value.is_object() || value.is_array() {
            let mut subtree = value.clone();
            walk::transform_leaves(&mut subtree, &FieldPath::root(), |leaf_path, leaf| {
                self.decrypt_leaf(field.join(&leaf_path), leaf)
            })
            .await?;
            Ok(Some(subtree))
        } else {
            let decrypted = self.decrypt_leaf(field.clone(), value.clone()).await?;
            Ok(Some(decrypted))
        }
    }

    async fn encrypt_leaf(
        &self,
        collection: &str,
        leaf_path: FieldPath,
        value: Value,
    ) -> EngineResult<Value> {
        let encoded = narrow::encode(&value);
        let ciphertext = self
            .cipher
            .encrypt(&encoded, collection, self.settings.algorithm)
            .await
            .map_err(|source| {
                error!(collection, path = %leaf_path, "field encryption failed");
                EngineError::Encryption {
                    collection: collection.to_string(),
                    path: leaf_path.to_string(),
                    source,
                }
            })?;
        Ok(Value::String(ciphertext.to_marked_string()))
    }

    async fn decrypt_leaf(&self, leaf_path: FieldPath, value: Value) -> EngineResult<Value> {
        let Value::String(text) = value else {
            return Ok(value);
        };
        if !FieldCiphertext::is_marked(&text) {
            return Ok(Value::String(text));
        }

        let wrap_err = |source| {
            error!(path = %leaf_path, "field decryption failed");
            EngineError::Decryption {
                path: leaf_path.to_string(),
                source,
            }
        };
        let ciphertext = FieldCiphertext::from_marked_string(&text).map_err(wrap_err)?;
        let plaintext = self.cipher.decrypt(&ciphertext).await.map_err(wrap_err)?;
        Ok(narrow::decode(&plaintext))
    }
}

/// Selects the fields a rule applies to and expands wildcards against
/// the document, yielding concrete paths only.
fn expand_fields(rule: &CollectionRule, source: &Value) -> Vec<FieldPath> {
    let mut concrete = Vec::new();
    for field in select_fields(rule, source) {
        if field.has_wildcard() {
            concrete.extend(path::resolve(source, &field));
        } else {
            concrete.push(field);
        }
    }
    concrete
}

/// Applies the include/exclude/auto precedence to pick the field set.
fn select_fields(rule: &CollectionRule, source: &Value) -> Vec<FieldPath> {
    if !rule.auto_encrypt {
        return Vec::new();
    }
    if !rule.include_fields.is_empty() {
        return rule.include_fields.clone();
    }
    let Some(map) = source.as_object() else {
        return Vec::new();
    };
    let top_level = map.keys().map(|key| FieldPath::field(key.clone()));
    if rule.exclude_fields.is_empty() {
        top_level.collect()
    } else {
        top_level
            .filter(|field| !rule.exclude_fields.contains(field))
            .collect()
    }
}

/// Archives the encrypted value under `original_attributes` and
/// overwrites the display position with a mask. Skipped for fields
/// already archived and for `original_attributes` itself.
fn mask_field(field: &FieldPath, source: &Value, result: &mut Value) {
    if matches!(field.first(), Some(Segment::Field(name)) if name == ORIGINAL_ATTRIBUTES) {
        return;
    }
    let archive_path = field.prefixed_with(ORIGINAL_ATTRIBUTES);
    if path::has_path(result, &archive_path) {
        return;
    }
    let Some(encrypted) = path::get_path(result, field).cloned() else {
        return;
    };
    path::set_path(result, &archive_path, encrypted);

    let plaintext = path::get_path(source, field).cloned().unwrap_or(Value::Null);
    path::set_path(result, field, mask_value(&plaintext));
}

fn strip_id(document: &mut Value) {
    if let Some(map) = document.as_object_mut() {
        map.remove(ID_FIELD);
    }
}
