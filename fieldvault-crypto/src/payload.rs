//! Opaque payload encryption.
//!
//! Encrypts whole values handed over by collaborators (object-storage
//! blobs, export bundles) with a directly-supplied key, independent of the
//! per-collection field engine. Values pass through the wide codec so
//! non-string types survive the round trip; object and array trees keep
//! their shape with every leaf encrypted individually.

use crate::cipher::{decrypt_string, encrypt_string, Algorithm};
use crate::error::{CryptoError, CryptoResult};
use crate::key::SecretKey;
use fieldvault_codec::{wide, PlainValue};
use serde_json::Value;

/// Encrypts a payload value.
///
/// Scalars and dates become a single opaque base64 string. Objects and
/// arrays are returned with the same shape and every leaf encrypted;
/// null leaves are left in place.
pub fn encrypt_payload(value: &PlainValue, key: &SecretKey) -> CryptoResult<Value> {
    match value {
        PlainValue::Json(tree) if tree.is_object() || tree.is_array() => {
            let mut encrypted = tree.clone();
            encrypt_tree(&mut encrypted, key)?;
            Ok(encrypted)
        }
        scalar => Ok(Value::String(encrypt_leaf(scalar, key)?)),
    }
}

/// Decrypts a payload produced by [`encrypt_payload`].
pub fn decrypt_payload(value: &Value, key: &SecretKey) -> CryptoResult<PlainValue> {
    match value {
        Value::String(s) => decrypt_leaf(s, key),
        Value::Object(_) | Value::Array(_) => {
            let mut decrypted = value.clone();
            decrypt_tree(&mut decrypted, key)?;
            Ok(PlainValue::Json(decrypted))
        }
        other => Err(CryptoError::Decryption(format!(
            "unsupported payload shape: {}",
            type_name(other)
        ))),
    }
}

fn encrypt_tree(tree: &mut Value, key: &SecretKey) -> CryptoResult<()> {
    match tree {
        Value::Object(map) => {
            for child in map.values_mut() {
                encrypt_tree(child, key)?;
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                encrypt_tree(child, key)?;
            }
        }
        Value::Null => {}
        ref leaf => {
            let plain = leaf_plain(leaf)?;
            *tree = Value::String(encrypt_leaf(&plain, key)?);
        }
    }
    Ok(())
}

fn decrypt_tree(tree: &mut Value, key: &SecretKey) -> CryptoResult<()> {
    match tree {
        Value::Object(map) => {
            for child in map.values_mut() {
                decrypt_tree(child, key)?;
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                decrypt_tree(child, key)?;
            }
        }
        Value::Null => {}
        Value::String(s) => {
            *tree = decrypt_leaf(s, key)?.into_value();
        }
        other => {
            return Err(CryptoError::Decryption(format!(
                "unexpected unencrypted leaf: {}",
                type_name(other)
            )));
        }
    }
    Ok(())
}

fn encrypt_leaf(plain: &PlainValue, key: &SecretKey) -> CryptoResult<String> {
    let encoded = wide::encode(plain)?;
    encrypt_string(key, &encoded, Algorithm::Randomized)
}

fn decrypt_leaf(encoded: &str, key: &SecretKey) -> CryptoResult<PlainValue> {
    let plaintext = decrypt_string(key, encoded)?;
    Ok(wide::decode(&plaintext)?)
}

fn leaf_plain(leaf: &Value) -> CryptoResult<PlainValue> {
    match leaf {
        Value::String(s) => Ok(PlainValue::String(s.clone())),
        Value::Number(n) => Ok(PlainValue::Number(n.clone())),
        Value::Bool(b) => Ok(PlainValue::Bool(*b)),
        other => Err(CryptoError::Encryption(format!(
            "unsupported leaf type: {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
