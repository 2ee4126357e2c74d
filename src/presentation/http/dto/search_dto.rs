use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::application::ports::ScoredEntry;

#[derive(Debug, Deserialize)]
pub struct SearchRequestDto {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct SearchResponseDto {
    pub query: String,
    pub results: Vec<SearchResultDto>,
    pub total_results: usize,
    pub search_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResultDto {
    pub chunk_id: String,
    pub document_id: Uuid,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

impl From<ScoredEntry> for SearchResultDto {
    fn from(entry: ScoredEntry) -> Self {
        Self {
            chunk_id: entry.id,
            document_id: entry.document_id,
            content: entry.content,
            metadata: entry.metadata,
            score: entry.score,
        }
    }
}
