use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::{StageOutcome, UploadStagingManager};
use crate::error::IngestResult;

#[derive(Debug, Clone)]
pub struct SubmitUploadRequest {
    pub kb_id: Uuid,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitUploadResponse {
    pub file_name: String,
    pub outcome: StageOutcome,
}

impl SubmitUploadResponse {
    pub fn status(&self) -> &'static str {
        match self.outcome {
            StageOutcome::Exists { .. } => "exists",
            StageOutcome::Pending { .. } => "pending",
        }
    }

    pub fn skip_processing(&self) -> bool {
        matches!(self.outcome, StageOutcome::Exists { .. })
    }
}

pub struct SubmitUploadUseCase {
    staging: Arc<UploadStagingManager>,
}

impl SubmitUploadUseCase {
    pub fn new(staging: Arc<UploadStagingManager>) -> Self {
        Self { staging }
    }

    pub async fn execute(&self, request: SubmitUploadRequest) -> IngestResult<SubmitUploadResponse> {
        let outcome = self
            .staging
            .stage(
                request.kb_id,
                &request.file_name,
                request.content_type.as_deref(),
                request.data.as_slice(),
            )
            .await?;

        Ok(SubmitUploadResponse {
            file_name: request.file_name,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::Harness;

    #[tokio::test]
    async fn test_exists_outcome_skips_processing() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        harness.ingested_document(&kb, "a.txt", b"abc").await;
        let use_case = SubmitUploadUseCase::new(harness.staging.clone());

        let response = use_case
            .execute(SubmitUploadRequest {
                kb_id: kb.id(),
                file_name: "a.txt".to_string(),
                content_type: None,
                data: b"abc".to_vec(),
            })
            .await
            .unwrap();

        assert_eq!(response.status(), "exists");
        assert!(response.skip_processing());
    }
}
