use std::sync::Arc;
use uuid::Uuid;

use super::submit_processing::{SubmitProcessingRequest, SubmitProcessingUseCase, TaskSubmission};
use super::submit_upload::{SubmitUploadRequest, SubmitUploadResponse, SubmitUploadUseCase};
use crate::application::services::StageOutcome;
use crate::domain::value_objects::ChunkingConfig;
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAndProcessResponse {
    pub uploads: Vec<SubmitUploadResponse>,
    pub tasks: Vec<TaskSubmission>,
}

/// Stages files and queues processing for the new ones in one call, with no
/// preview step in between.
pub struct UploadAndProcessUseCase {
    upload_use_case: Arc<SubmitUploadUseCase>,
    process_use_case: Arc<SubmitProcessingUseCase>,
}

impl UploadAndProcessUseCase {
    pub fn new(
        upload_use_case: Arc<SubmitUploadUseCase>,
        process_use_case: Arc<SubmitProcessingUseCase>,
    ) -> Self {
        Self {
            upload_use_case,
            process_use_case,
        }
    }

    pub async fn execute(
        &self,
        kb_id: Uuid,
        files: Vec<SubmitUploadRequest>,
        chunking: Option<ChunkingConfig>,
    ) -> IngestResult<UploadAndProcessResponse> {
        if files.is_empty() {
            return Err(IngestError::Validation("No file provided".to_string()));
        }
        // Checked before staging so a bad override leaves no pending uploads behind
        if let Some(config) = &chunking {
            config.validate().map_err(IngestError::Validation)?;
        }

        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            uploads.push(self.upload_use_case.execute(file).await?);
        }

        let upload_ids: Vec<Uuid> = uploads
            .iter()
            .filter_map(|upload| match upload.outcome {
                StageOutcome::Pending { upload_id, .. } => Some(upload_id),
                StageOutcome::Exists { .. } => None,
            })
            .collect();
        if upload_ids.is_empty() {
            return Ok(UploadAndProcessResponse {
                uploads,
                tasks: Vec::new(),
            });
        }

        let submitted = self
            .process_use_case
            .execute(SubmitProcessingRequest {
                kb_id,
                upload_ids,
                chunking,
            })
            .await?;

        Ok(UploadAndProcessResponse {
            uploads,
            tasks: submitted.tasks,
        })
    }
}
