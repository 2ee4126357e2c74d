use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::ProcessingTaskCoordinator;
use crate::domain::entities::ProcessingTask;
use crate::error::IngestResult;

pub struct GetTaskStatusUseCase {
    coordinator: Arc<ProcessingTaskCoordinator>,
}

impl GetTaskStatusUseCase {
    pub fn new(coordinator: Arc<ProcessingTaskCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn execute(&self, task_id: Uuid) -> IngestResult<ProcessingTask> {
        self.coordinator.get(task_id).await
    }
}
