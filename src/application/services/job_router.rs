use async_trait::async_trait;
use std::sync::Arc;

use super::cleanup_orchestrator::ConsistencyCleanupOrchestrator;
use super::document_processor::DocumentProcessor;
use crate::application::ports::{JobHandler, JobMessage, JobPayload};
use crate::error::IngestError;

/// Sends each delivered job to the service that knows how to run it.
pub struct JobRouter {
    processor: Arc<DocumentProcessor>,
    orchestrator: Arc<ConsistencyCleanupOrchestrator>,
}

impl JobRouter {
    pub fn new(
        processor: Arc<DocumentProcessor>,
        orchestrator: Arc<ConsistencyCleanupOrchestrator>,
    ) -> Self {
        Self {
            processor,
            orchestrator,
        }
    }
}

#[async_trait]
impl JobHandler for JobRouter {
    async fn handle(&self, message: &JobMessage) -> Result<(), IngestError> {
        match &message.payload {
            JobPayload::ProcessDocument {
                upload_id,
                chunking,
                ..
            } => self
                .processor
                .process(message.task_id, *upload_id, chunking)
                .await
                .map(|_| ()),
            payload => self.orchestrator.run_cleanup(payload).await,
        }
    }
}
