use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::value_objects::{ChunkFingerprint, FileHash};

/// Deterministic digests for whole files and for chunks.
pub struct ContentFingerprinter;

impl ContentFingerprinter {
    pub fn hash(data: &[u8]) -> FileHash {
        FileHash::from_bytes(data)
    }

    pub fn chunk_fingerprint(
        kb_id: Uuid,
        file_name: &str,
        chunk_text: &str,
        chunk_metadata: &Map<String, Value>,
    ) -> ChunkFingerprint {
        ChunkFingerprint::compute(kb_id, file_name, chunk_text, chunk_metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_inputs_yield_identical_fingerprints() {
        let kb_id = Uuid::new_v4();
        let meta = json!({"source": "a.md"})
            .as_object()
            .cloned()
            .unwrap();

        let runs: Vec<ChunkFingerprint> = (0..3)
            .map(|_| ContentFingerprinter::chunk_fingerprint(kb_id, "a.md", "body", &meta))
            .collect();

        assert!(runs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(
            ContentFingerprinter::hash(b"body"),
            ContentFingerprinter::hash(b"body")
        );
    }
}
