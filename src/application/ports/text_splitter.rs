use serde_json::{Map, Value};

use crate::domain::value_objects::ChunkingConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// Pure text splitter. The same input and config always yield the same chunks.
pub trait TextSplitter: Send + Sync {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<TextChunk>;
}
