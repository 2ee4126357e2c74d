use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::BlobStore;
use crate::application::services::ProcessingTaskCoordinator;
use crate::domain::entities::{Document, DocumentUpload, ProcessingTask};
use crate::domain::repositories::{DocumentRepository, KnowledgeBaseRepository, UploadRepository};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct DocumentDetails {
    pub document: Document,
    pub tasks: Vec<ProcessingTask>,
}

/// A document together with every task that touched it.
pub struct GetDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    coordinator: Arc<ProcessingTaskCoordinator>,
}

impl GetDocumentUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        coordinator: Arc<ProcessingTaskCoordinator>,
    ) -> Self {
        Self {
            document_repository,
            coordinator,
        }
    }

    pub async fn execute(&self, kb_id: Uuid, document_id: Uuid) -> IngestResult<DocumentDetails> {
        let document = find_document(self.document_repository.as_ref(), kb_id, document_id).await?;
        let tasks = self
            .coordinator
            .list_for_knowledge_base(kb_id, None)
            .await?
            .into_iter()
            .filter(|task| task.document_id() == Some(document_id))
            .collect();

        Ok(DocumentDetails { document, tasks })
    }
}

/// Staged uploads of a knowledge base, newest first, in every status.
pub struct ListUploadsUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    upload_repository: Arc<dyn UploadRepository>,
}

impl ListUploadsUseCase {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        upload_repository: Arc<dyn UploadRepository>,
    ) -> Self {
        Self {
            knowledge_base_repository,
            upload_repository,
        }
    }

    pub async fn execute(&self, kb_id: Uuid) -> IngestResult<Vec<DocumentUpload>> {
        self.knowledge_base_repository
            .find_by_id(kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", kb_id)))?;

        Ok(self.upload_repository.list_by_knowledge_base(kb_id).await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Bytes of a document from its permanent blob location.
pub struct ReadDocumentFileUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    blob_store: Arc<dyn BlobStore>,
    bucket: String,
}

impl ReadDocumentFileUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        blob_store: Arc<dyn BlobStore>,
        bucket: String,
    ) -> Self {
        Self {
            document_repository,
            blob_store,
            bucket,
        }
    }

    pub async fn execute(&self, kb_id: Uuid, document_id: Uuid) -> IngestResult<DocumentFile> {
        let document = find_document(self.document_repository.as_ref(), kb_id, document_id).await?;

        let data = match self.blob_store.get(&self.bucket, document.file_path()).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                return Err(IngestError::NotFound(format!(
                    "File of document {}",
                    document_id
                )));
            }
            Err(e) => {
                return Err(IngestError::Processing(format!(
                    "Failed to read {}: {}",
                    document.file_path(),
                    e
                )));
            }
        };

        Ok(DocumentFile {
            file_name: document.file_name().to_string(),
            content_type: document.content_type().to_string(),
            data,
        })
    }
}

async fn find_document(
    repository: &dyn DocumentRepository,
    kb_id: Uuid,
    document_id: Uuid,
) -> IngestResult<Document> {
    repository
        .find_by_id(kb_id, document_id)
        .await?
        .ok_or_else(|| IngestError::NotFound(format!("Document {}", document_id)))
}
