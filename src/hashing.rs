//! Canonical JSON and content hashing
//!
//! `serde_json::Map` keeps object keys sorted (the `preserve_order` feature
//! stays off), so compact serialization is already canonical: two values
//! with the same logical content always hash the same. `reporters::render`
//! relies on the same ordering for its pretty output.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize `value` canonically (sorted object keys, compact)
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the canonical serialization of `value`
pub fn canonical_hash(value: &Value) -> String {
    sha256_hex(canonical_json(value).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({
            "b": 1,
            "a": { "d": [3, 2], "c": "text" }
        });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":"text","d":[3,2]},"b":1}"#
        );
    }

    #[test]
    fn test_canonical_json_matches_rendered_order() {
        let mut map = serde_json::Map::new();
        map.insert("zeta".into(), json!(1));
        map.insert("alpha".into(), json!({ "y": true, "x": null }));
        let value = Value::Object(map);
        assert_eq!(
            canonical_json(&value),
            r#"{"alpha":{"x":null,"y":true},"zeta":1}"#
        );
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":[1,2]}"#).expect("parse");
        let b: Value = serde_json::from_str(r#"{"y":[1,2],"x":1}"#).expect("parse");
        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
