//! Query fingerprinting.
//!
//! A fingerprint is the content address of a logical query: the SHA-256
//! digest of a canonical serialization of the query type plus every
//! present parameter. Equivalent queries hash identically no matter how
//! the caller's parameter map happened to be ordered.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Compute the deterministic fingerprint of a query.
///
/// Builds the canonical object `{"type": query_type}` merged with every
/// non-null entry of `params`, serializes it with keys sorted at every
/// depth, and returns the SHA-256 of the UTF-8 bytes as 64 hex characters.
///
/// Null-valued parameters are dropped before hashing, so an absent
/// parameter and an explicit null produce the same fingerprint, and
/// neither ever equals a present value.
pub fn query_fingerprint(query_type: &str, params: &Map<String, Value>) -> String {
    let type_value = Value::String(query_type.to_string());

    let mut canonical: BTreeMap<&str, &Value> = params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    // The type discriminator wins over a parameter that happens to share
    // its key.
    canonical.insert("type", &type_value);

    let mut serialized = String::new();
    serialized.push('{');
    for (i, (key, value)) in canonical.iter().enumerate() {
        if i > 0 {
            serialized.push(',');
        }
        write_json_string(key, &mut serialized);
        serialized.push(':');
        write_canonical(value, &mut serialized);
    }
    serialized.push('}');

    hex::encode(Sha256::digest(serialized.as_bytes()))
}

/// Serialize a JSON value with object keys sorted at every depth.
///
/// `serde_json`'s own map ordering depends on the `preserve_order` feature
/// flag, which any crate in the build graph can flip; hashing must not.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_canonical(value, out);
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
        // Scalars already serialize deterministically.
        other => out.push_str(&other.to_string()),
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_string()).to_string());
}
