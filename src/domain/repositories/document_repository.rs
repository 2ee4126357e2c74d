use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::entities::Document;
use crate::domain::value_objects::FileHash;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, RepositoryError>;

    async fn find_by_name_and_hash(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
        file_hash: &FileHash,
    ) -> Result<Option<Document>, RepositoryError>;

    async fn find_by_name(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, RepositoryError>;

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<Document>, RepositoryError>;

    /// Inserts the document or, when `(knowledge_base_id, file_name)` is taken,
    /// overwrites the stored content fields. Returns the stored row.
    async fn upsert(&self, document: &Document) -> Result<Document, RepositoryError>;

    /// Deletes the document's chunk rows, the document and the correlated
    /// upload atomically. Nothing is deleted when an error is returned.
    async fn delete_cascade(
        &self,
        document_id: Uuid,
        upload_id: Option<Uuid>,
    ) -> Result<(), RepositoryError>;
}
