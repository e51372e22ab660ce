//! Engine settings and the per-collection configuration table.
//!
//! The table is loaded once at process start and immutable thereafter;
//! unsynchronized concurrent reads are safe. The kill switch is an
//! explicit field threaded through the engine constructor, not ambient
//! process state.

use crate::error::EngineResult;
use crate::path::FieldPath;
use fieldvault_crypto::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine-wide settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Kill switch: when false, encrypt and decrypt are identity.
    pub enabled: bool,
    /// Envelope algorithm used for field values.
    pub algorithm: Algorithm,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: Algorithm::Randomized,
        }
    }
}

impl EngineSettings {
    /// Settings with encryption switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Field selection rules for one collection.
///
/// A non-empty include list wins outright; only when it is empty does
/// the exclude list apply as a denylist over top-level fields. With both
/// lists empty, `auto_encrypt` alone selects every top-level field.
/// Nothing is selected while `auto_encrypt` is false.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionRule {
    /// Dotted field paths to process (may contain `*` segments).
    #[serde(default)]
    pub include_fields: Vec<FieldPath>,
    /// Top-level fields to skip when the include list is empty.
    #[serde(default)]
    pub exclude_fields: Vec<FieldPath>,
    /// Master toggle for this collection.
    #[serde(default)]
    pub auto_encrypt: bool,
}

impl CollectionRule {
    /// A rule with auto-encrypt on and no field lists (all top-level
    /// fields are processed).
    pub fn auto() -> Self {
        Self {
            auto_encrypt: true,
            ..Self::default()
        }
    }

    /// Sets the include list from dotted path strings.
    pub fn with_include_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_fields = fields
            .into_iter()
            .map(|f| FieldPath::parse(f.as_ref()))
            .collect();
        self
    }

    /// Sets the exclude list from dotted path strings.
    pub fn with_exclude_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_fields = fields
            .into_iter()
            .map(|f| FieldPath::parse(f.as_ref()))
            .collect();
        self
    }
}

/// Immutable per-collection configuration table, keyed by collection
/// name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionConfig {
    collections: HashMap<String, CollectionRule>,
}

impl EncryptionConfig {
    /// An empty table (every transform is a no-op).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection rule (builder style).
    pub fn with_collection(mut self, name: impl Into<String>, rule: CollectionRule) -> Self {
        self.collections.insert(name.into(), rule);
        self
    }

    /// Returns the rule for a collection, if configured.
    pub fn rule(&self, collection: &str) -> Option<&CollectionRule> {
        self.collections.get(collection)
    }

    /// Iterates configured collection names (for key provisioning).
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Loads the table from its JSON representation:
    /// `{"users": {"include_fields": ["ssn"], "auto_encrypt": true}}`.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
