use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::entities::DocumentUpload;
use crate::domain::value_objects::{FileHash, UploadStatus};

#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn save(&self, upload: &DocumentUpload) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, upload_id: Uuid) -> Result<Option<DocumentUpload>, RepositoryError>;
    async fn find_by_hash(
        &self,
        knowledge_base_id: Uuid,
        file_hash: &FileHash,
    ) -> Result<Option<DocumentUpload>, RepositoryError>;
    async fn update_status(
        &self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, RepositoryError>;
    /// Moves the upload from `expected` to `next` only if `expected` is the
    /// stored status. Returns whether the row changed.
    async fn transition_status(
        &self,
        upload_id: Uuid,
        expected: UploadStatus,
        next: UploadStatus,
    ) -> Result<bool, RepositoryError>;
    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<DocumentUpload>, RepositoryError>;
    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DocumentUpload>, RepositoryError>;
    async fn delete(&self, upload_id: Uuid) -> Result<bool, RepositoryError>;
}
