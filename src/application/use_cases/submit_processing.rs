use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::JobPayload;
use crate::application::services::{AsyncDispatcher, ProcessingTaskCoordinator};
use crate::domain::repositories::{KnowledgeBaseRepository, UploadRepository};
use crate::domain::value_objects::{ChunkingConfig, JobKind, UploadStatus};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct SubmitProcessingRequest {
    pub kb_id: Uuid,
    pub upload_ids: Vec<Uuid>,
    pub chunking: Option<ChunkingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmission {
    pub upload_id: Uuid,
    pub task_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitProcessingResponse {
    pub tasks: Vec<TaskSubmission>,
}

pub struct SubmitProcessingUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    upload_repository: Arc<dyn UploadRepository>,
    coordinator: Arc<ProcessingTaskCoordinator>,
    dispatcher: Arc<AsyncDispatcher>,
    default_chunking: ChunkingConfig,
}

impl SubmitProcessingUseCase {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        upload_repository: Arc<dyn UploadRepository>,
        coordinator: Arc<ProcessingTaskCoordinator>,
        dispatcher: Arc<AsyncDispatcher>,
        default_chunking: ChunkingConfig,
    ) -> Self {
        Self {
            knowledge_base_repository,
            upload_repository,
            coordinator,
            dispatcher,
            default_chunking,
        }
    }

    pub async fn execute(
        &self,
        request: SubmitProcessingRequest,
    ) -> IngestResult<SubmitProcessingResponse> {
        // Bad split parameters never reach the queue
        let chunking = request.chunking.unwrap_or(self.default_chunking);
        chunking.validate().map_err(IngestError::Validation)?;

        self.knowledge_base_repository
            .find_by_id(request.kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", request.kb_id)))?;

        // Resolve every upload before creating any task
        let mut uploads = Vec::with_capacity(request.upload_ids.len());
        for upload_id in &request.upload_ids {
            let upload = self
                .upload_repository
                .find_by_id(*upload_id)
                .await?
                .filter(|upload| upload.knowledge_base_id() == request.kb_id)
                .ok_or_else(|| IngestError::NotFound(format!("Upload {}", upload_id)))?;
            if upload.status() != UploadStatus::Pending {
                return Err(IngestError::Validation(format!(
                    "Upload {} is {}; only pending uploads can be processed",
                    upload_id,
                    upload.status()
                )));
            }
            uploads.push(upload);
        }

        // Claiming moves each upload to processing, so a second submission
        // of the same upload is refused instead of racing the first.
        let mut claimed: Vec<Uuid> = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            let won = self
                .upload_repository
                .transition_status(upload.id(), UploadStatus::Pending, UploadStatus::Processing)
                .await;
            match won {
                Ok(true) => claimed.push(upload.id()),
                Ok(false) => {
                    self.release(&claimed).await;
                    return Err(IngestError::Validation(format!(
                        "Upload {} is already submitted",
                        upload.id()
                    )));
                }
                Err(e) => {
                    self.release(&claimed).await;
                    return Err(e.into());
                }
            }
        }

        let mut tasks: Vec<TaskSubmission> = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let task = match self
                .coordinator
                .create(request.kb_id, JobKind::ProcessDoc, None, Some(upload.id()))
                .await
            {
                Ok(task) => task,
                Err(e) => {
                    let unsubmitted: Vec<Uuid> = claimed
                        .iter()
                        .copied()
                        .filter(|id| !tasks.iter().any(|t| t.upload_id == *id))
                        .collect();
                    self.release(&unsubmitted).await;
                    return Err(e);
                }
            };

            let payload = JobPayload::ProcessDocument {
                knowledge_base_id: request.kb_id,
                upload_id: upload.id(),
                chunking,
            };
            // A failed submission is already recorded on the task
            if let Err(e) = self.dispatcher.fire_and_forget(&task, payload).await {
                warn!("Processing of upload {} not queued: {}", upload.id(), e);
                self.release(&[upload.id()]).await;
            }

            tasks.push(TaskSubmission {
                upload_id: upload.id(),
                task_id: task.id(),
            });
        }

        Ok(SubmitProcessingResponse { tasks })
    }

    /// Returns claimed uploads to pending so they can be submitted again.
    async fn release(&self, upload_ids: &[Uuid]) {
        for upload_id in upload_ids {
            if let Err(e) = self
                .upload_repository
                .transition_status(*upload_id, UploadStatus::Processing, UploadStatus::Pending)
                .await
            {
                warn!("Failed to release upload {}: {}", upload_id, e);
            }
        }
    }
}
