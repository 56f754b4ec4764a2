//! Content-hash key derivation.
//!
//! Keys are the hex SHA-256 of a canonical JSON serialization in which
//! object keys are sorted at every depth, so two inputs that differ only in
//! field order hash to the same key.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Returns the canonical JSON text for `value`.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = canonicalize(serde_json::to_value(value)?);
    Ok(serde_json::to_string(&value)?)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map.into_iter().collect();
            fields.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Hex-encoded SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Derives a content-hash key for any serializable value.
pub fn content_key<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Derives a key from raw text without a JSON round-trip.
pub fn text_key(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_key_is_deterministic() {
        let a = content_key(&json!({"prompt": "hi", "temperature": 0.2})).unwrap();
        let b = content_key(&json!({"prompt": "hi", "temperature": 0.2})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        #[derive(Serialize)]
        struct Forward {
            model: &'static str,
            temperature: f64,
        }
        #[derive(Serialize)]
        struct Reversed {
            temperature: f64,
            model: &'static str,
        }

        let forward = content_key(&Forward { model: "m", temperature: 0.7 }).unwrap();
        let reversed = content_key(&Reversed { temperature: 0.7, model: "m" }).unwrap();
        assert_eq!(forward, reversed);

        let mut map = HashMap::new();
        map.insert("temperature", json!(0.7));
        map.insert("model", json!("m"));
        assert_eq!(content_key(&map).unwrap(), forward);
    }

    #[test]
    fn test_distinct_inputs_distinct_keys() {
        assert_ne!(text_key("a"), text_key("b"));
        assert_ne!(
            content_key(&("q", json!({"x": 1}))).unwrap(),
            content_key(&("q", json!({"x": 2}))).unwrap()
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            text_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
