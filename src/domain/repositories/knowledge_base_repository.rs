use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::entities::KnowledgeBase;

#[async_trait]
pub trait KnowledgeBaseRepository: Send + Sync {
    async fn save(&self, knowledge_base: &KnowledgeBase) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<KnowledgeBase>, RepositoryError>;
    /// Overwrites name, description and `updated_at`. Returns whether the row
    /// existed.
    async fn update(&self, knowledge_base: &KnowledgeBase) -> Result<bool, RepositoryError>;
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<KnowledgeBase>, RepositoryError>;
    /// Removes the knowledge base with its documents, uploads and chunk rows
    /// in one transaction. Tasks survive with the reference cleared.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}
