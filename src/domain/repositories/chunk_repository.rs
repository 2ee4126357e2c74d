use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::entities::DocumentChunk;

/// Chunk id and content hash as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChunk {
    pub id: String,
    pub hash: String,
}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    async fn find_recorded(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Vec<RecordedChunk>, RepositoryError>;

    /// Rows whose id already exists are skipped. Returns the number inserted.
    async fn insert_batch(&self, chunks: &[DocumentChunk]) -> Result<usize, RepositoryError>;

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, RepositoryError>;

    async fn count_by_document(&self, document_id: Uuid) -> Result<i64, RepositoryError>;
}
