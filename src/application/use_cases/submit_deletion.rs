use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::{ConsistencyCleanupOrchestrator, DeletionReceipt};
use crate::error::IngestResult;

pub struct SubmitDeletionUseCase {
    orchestrator: Arc<ConsistencyCleanupOrchestrator>,
}

impl SubmitDeletionUseCase {
    pub fn new(orchestrator: Arc<ConsistencyCleanupOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, kb_id: Uuid, document_id: Uuid) -> IngestResult<DeletionReceipt> {
        self.orchestrator.delete_document(kb_id, document_id).await
    }
}
