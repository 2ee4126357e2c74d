use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::knowledge_base_dto::{DocumentDto, document_content_path};
use super::task_dto::TaskDto;
use crate::application::services::{DeletionReceipt, ExpireReport, StageOutcome};
use crate::application::use_cases::{
    DocumentDetails, PreviewDocumentResponse, SubmitProcessingResponse, SubmitUploadResponse,
    TaskSubmission, UploadAndProcessResponse,
};
use crate::domain::entities::{Document, DocumentUpload};
use crate::domain::value_objects::ChunkingConfig;

/// One entry per uploaded file, in request order.
#[derive(Debug, Serialize)]
pub struct UploadResultDto {
    pub file_name: String,
    pub status: String,
    pub skip_processing: bool,
    pub upload_id: Option<Uuid>,
    pub document_id: Option<Uuid>,
    pub temp_path: Option<String>,
}

impl From<SubmitUploadResponse> for UploadResultDto {
    fn from(response: SubmitUploadResponse) -> Self {
        let status = response.status().to_string();
        let skip_processing = response.skip_processing();
        let (upload_id, document_id, temp_path) = match response.outcome {
            StageOutcome::Exists { document_id } => (None, Some(document_id), None),
            StageOutcome::Pending {
                upload_id,
                temp_path,
            } => (Some(upload_id), None, Some(temp_path)),
        };

        Self {
            file_name: response.file_name,
            status,
            skip_processing,
            upload_id,
            document_id,
            temp_path,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponseDto {
    pub uploads: Vec<UploadResultDto>,
}

/// Split parameters a client may override; missing fields use the server defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ChunkingDto {
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

impl ChunkingDto {
    pub fn is_empty(&self) -> bool {
        self.chunk_size.is_none() && self.chunk_overlap.is_none()
    }

    pub fn resolve(&self, defaults: ChunkingConfig) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap: self.chunk_overlap.unwrap_or(defaults.chunk_overlap),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequestDto {
    pub upload_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub chunking: ChunkingDto,
}

#[derive(Debug, Serialize)]
pub struct TaskSubmissionDto {
    pub upload_id: Uuid,
    pub task_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponseDto {
    pub tasks: Vec<TaskSubmissionDto>,
}

impl From<TaskSubmission> for TaskSubmissionDto {
    fn from(task: TaskSubmission) -> Self {
        Self {
            upload_id: task.upload_id,
            task_id: task.task_id,
        }
    }
}

impl From<SubmitProcessingResponse> for ProcessResponseDto {
    fn from(response: SubmitProcessingResponse) -> Self {
        Self {
            tasks: response.tasks.into_iter().map(TaskSubmissionDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FullProcessResponseDto {
    pub uploads: Vec<UploadResultDto>,
    pub tasks: Vec<TaskSubmissionDto>,
}

impl From<UploadAndProcessResponse> for FullProcessResponseDto {
    fn from(response: UploadAndProcessResponse) -> Self {
        Self {
            uploads: response.uploads.into_iter().map(UploadResultDto::from).collect(),
            tasks: response.tasks.into_iter().map(TaskSubmissionDto::from).collect(),
        }
    }
}

/// A staged upload as listed for its knowledge base.
#[derive(Debug, Serialize)]
pub struct StagedUploadDto {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub file_size: i64,
    pub content_type: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
}

impl From<&DocumentUpload> for StagedUploadDto {
    fn from(upload: &DocumentUpload) -> Self {
        Self {
            id: upload.id(),
            knowledge_base_id: upload.knowledge_base_id(),
            file_name: upload.file_name().to_string(),
            file_hash: upload.file_hash().as_str().to_string(),
            file_size: upload.file_size(),
            content_type: upload.content_type().to_string(),
            status: upload.status().as_str().to_string(),
            error_message: upload.error_message().map(str::to_string),
            created_at: upload.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StagedUploadListDto {
    pub uploads: Vec<StagedUploadDto>,
}

#[derive(Debug, Serialize)]
pub struct DocumentDetailDto {
    #[serde(flatten)]
    pub document: DocumentDto,
    pub tasks: Vec<TaskDto>,
}

impl From<DocumentDetails> for DocumentDetailDto {
    fn from(details: DocumentDetails) -> Self {
        Self {
            document: DocumentDto::from_document(&details.document),
            tasks: details.tasks.iter().map(TaskDto::from).collect(),
        }
    }
}

/// What a client needs to open a document.
#[derive(Debug, Serialize)]
pub struct DocumentViewDto {
    pub document_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub view_url: String,
}

impl DocumentViewDto {
    pub fn from_document(document: &Document) -> Self {
        Self {
            document_id: document.id(),
            file_name: document.file_name().to_string(),
            content_type: document.content_type().to_string(),
            file_size: document.file_size(),
            view_url: document_content_path(document.knowledge_base_id(), document.id()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletionResponseDto {
    pub task_id: Uuid,
    pub warnings: Vec<String>,
}

impl From<DeletionReceipt> for DeletionResponseDto {
    fn from(receipt: DeletionReceipt) -> Self {
        Self {
            task_id: receipt.task_id,
            warnings: receipt.warnings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpireResponseDto {
    pub removed: usize,
    pub blob_failures: usize,
}

impl From<ExpireReport> for ExpireResponseDto {
    fn from(report: ExpireReport) -> Self {
        Self {
            removed: report.removed,
            blob_failures: report.blob_failures,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewChunkDto {
    pub content: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponseDto {
    pub file_name: String,
    pub chunks: Vec<PreviewChunkDto>,
    pub total_chunks: usize,
}

impl From<PreviewDocumentResponse> for PreviewResponseDto {
    fn from(response: PreviewDocumentResponse) -> Self {
        Self {
            file_name: response.file_name,
            chunks: response
                .chunks
                .into_iter()
                .map(|chunk| PreviewChunkDto {
                    content: chunk.content,
                    metadata: chunk.metadata,
                })
                .collect(),
            total_chunks: response.total_chunks,
        }
    }
}
