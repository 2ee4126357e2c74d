use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Vector backend error: {0}")]
    Backend(String),
}

impl VectorIndexError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorIndexError::CollectionNotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub id: String,
    pub document_id: Uuid,
    pub content: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub id: String,
    pub document_id: Uuid,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

/// Similarity index keyed by chunk id and partitioned into named collections.
/// Implementations embed entry content themselves.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(&self, collection: &str, entries: &[VectorEntry]) -> Result<(), VectorIndexError>;

    /// Returns how many of `ids` were present.
    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<usize, VectorIndexError>;

    async fn delete_by_document(
        &self,
        collection: &str,
        document_id: Uuid,
    ) -> Result<usize, VectorIndexError>;

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorIndexError>;

    async fn similarity_search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, VectorIndexError>;
}
