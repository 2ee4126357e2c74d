use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{BlobStore, DocumentExtractor};
use crate::application::services::{ChunkSynchronizer, SyncTarget};
use crate::domain::repositories::{DocumentRepository, UploadRepository};
use crate::domain::value_objects::ChunkingConfig;
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct PreviewDocumentRequest {
    pub kb_id: Uuid,
    /// A document id, or the id of an upload that was not processed yet.
    pub id: Uuid,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewChunk {
    pub content: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewDocumentResponse {
    pub file_name: String,
    pub chunks: Vec<PreviewChunk>,
    pub total_chunks: usize,
}

/// Shows how a file would be split without touching the index.
pub struct PreviewDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    upload_repository: Arc<dyn UploadRepository>,
    blob_store: Arc<dyn BlobStore>,
    document_extractor: Arc<dyn DocumentExtractor>,
    synchronizer: Arc<ChunkSynchronizer>,
    bucket: String,
}

impl PreviewDocumentUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        upload_repository: Arc<dyn UploadRepository>,
        blob_store: Arc<dyn BlobStore>,
        document_extractor: Arc<dyn DocumentExtractor>,
        synchronizer: Arc<ChunkSynchronizer>,
        bucket: String,
    ) -> Self {
        Self {
            document_repository,
            upload_repository,
            blob_store,
            document_extractor,
            synchronizer,
            bucket,
        }
    }

    pub async fn execute(
        &self,
        request: PreviewDocumentRequest,
    ) -> IngestResult<PreviewDocumentResponse> {
        request
            .chunking
            .validate()
            .map_err(IngestError::Validation)?;

        let (file_name, path, content_type) = match self
            .document_repository
            .find_by_id(request.kb_id, request.id)
            .await?
        {
            Some(document) => (
                document.file_name().to_string(),
                document.file_path().to_string(),
                document.content_type().to_string(),
            ),
            None => {
                let upload = self
                    .upload_repository
                    .find_by_id(request.id)
                    .await?
                    .filter(|upload| upload.knowledge_base_id() == request.kb_id)
                    .ok_or_else(|| IngestError::NotFound(format!("Document {}", request.id)))?;
                (
                    upload.file_name().to_string(),
                    upload.temp_path().to_string(),
                    upload.content_type().to_string(),
                )
            }
        };

        let data = self
            .blob_store
            .get(&self.bucket, &path)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => IngestError::NotFound(format!("File {}", path)),
                e => IngestError::Processing(e.to_string()),
            })?;
        let extracted = self
            .document_extractor
            .extract_text_from_bytes(&data, &content_type)
            .await
            .map_err(|e| IngestError::Processing(e.to_string()))?;

        let target = SyncTarget {
            kb_id: request.kb_id,
            document_id: request.id,
            file_name: file_name.clone(),
        };
        let chunks: Vec<PreviewChunk> = self
            .synchronizer
            .candidates(&target, &extracted.text, &request.chunking)?
            .into_iter()
            .map(|candidate| PreviewChunk {
                content: candidate.content,
                metadata: candidate.metadata,
            })
            .collect();

        Ok(PreviewDocumentResponse {
            file_name,
            total_chunks: chunks.len(),
            chunks,
        })
    }
}
