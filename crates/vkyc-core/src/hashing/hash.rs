//! Hash helpers sobre blake3 (hex).

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hashea bytes crudos (frames de cámara) y devuelve hex.
pub fn hash_bytes(input: &[u8]) -> String {
    blake3::hash(input).to_hex().to_string()
}

/// Hash del JSON canonicalizado.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}
