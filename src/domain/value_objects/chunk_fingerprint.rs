use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::file_hash::digest_hex;

/// Content-derived identity of a chunk.
///
/// `content_hash` covers the chunk text and its metadata; `chunk_id` scopes
/// that hash to one file of one knowledge base. Both are pure functions of
/// their inputs, which is what lets a re-sync skip unchanged chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkFingerprint {
    pub content_hash: String,
    pub chunk_id: String,
}

impl ChunkFingerprint {
    pub fn compute(
        kb_id: Uuid,
        file_name: &str,
        chunk_text: &str,
        chunk_metadata: &Map<String, Value>,
    ) -> Self {
        let mut payload = String::with_capacity(chunk_text.len() + 64);
        payload.push_str(chunk_text);
        payload.push_str(&canonical_json(chunk_metadata));
        let content_hash = digest_hex(payload.as_bytes());

        let chunk_id = digest_hex(format!("{}:{}:{}", kb_id, file_name, content_hash).as_bytes());

        Self {
            content_hash,
            chunk_id,
        }
    }
}

/// Serializes metadata with keys in sorted order at every depth.
fn canonical_json(metadata: &Map<String, Value>) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = Map::new();
                for key in keys {
                    out.insert(key.clone(), sorted(&map[key]));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }

    let mut keys: Vec<&String> = metadata.keys().collect();
    keys.sort();
    let mut out = String::from("{");
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        out.push_str(&sorted(&metadata[key]).to_string());
    }
    out.push('}');
    out
}
