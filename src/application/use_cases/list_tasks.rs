use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::ProcessingTaskCoordinator;
use crate::domain::entities::ProcessingTask;
use crate::domain::repositories::KnowledgeBaseRepository;
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, Default)]
pub struct ListTasksRequest {
    pub kb_id: Uuid,
    pub task_ids: Option<Vec<Uuid>>,
}

pub struct ListTasksUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    coordinator: Arc<ProcessingTaskCoordinator>,
}

impl ListTasksUseCase {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        coordinator: Arc<ProcessingTaskCoordinator>,
    ) -> Self {
        Self {
            knowledge_base_repository,
            coordinator,
        }
    }

    pub async fn execute(&self, request: ListTasksRequest) -> IngestResult<Vec<ProcessingTask>> {
        self.knowledge_base_repository
            .find_by_id(request.kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", request.kb_id)))?;

        self.coordinator
            .list_for_knowledge_base(request.kb_id, request.task_ids.as_deref())
            .await
    }
}
