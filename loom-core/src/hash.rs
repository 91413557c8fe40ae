//! Canonical JSON serialization and content hashing (§3 invariant 2, §4.2).

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serializes `value` as compact JSON with object keys sorted
/// lexicographically at every depth, matching Python's
/// `json.dumps(value, sort_keys=True, separators=(",", ":"))`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("string keys always serialize"));
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => {
            out.push_str(&serde_json::to_string(other).expect("primitives always serialize"));
        }
    }
}

/// SHA-256 of the canonical JSON serialization of `value`, hex-lowercase
/// (§4.2 numeric/edge-case policies).
pub fn content_hash(value: &Value) -> String {
    let canonical = canonical_json(value);
    let digest = Sha256::digest(canonical.as_bytes());
    hex_lower(&digest)
}

/// Byte length of the canonical JSON serialization, used for
/// `metadata.original_size` during compaction (§4.2).
pub fn canonical_byte_len(value: &Value) -> u64 {
    canonical_json(value).len() as u64
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).expect("writing to a String never fails");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_depth() {
        let a = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let b = json!({"a": {"c": 3, "d": 2}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn hash_is_stable_under_key_reordering() {
        let a = json!({"x": [1, 2, 3], "y": "z"});
        let b = json!({"y": "z", "x": [1, 2, 3]});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_changes_with_content() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    proptest::proptest! {
        #[test]
        fn hash_is_deterministic(s in "[a-z]{1,12}", n in 0i64..1000) {
            let value = serde_json::json!({"key": s, "n": n});
            let h1 = content_hash(&value);
            let h2 = content_hash(&value);
            proptest::prop_assert_eq!(h1, h2);
        }
    }
}
