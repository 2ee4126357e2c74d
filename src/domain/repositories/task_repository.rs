use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::entities::ProcessingTask;
use crate::domain::value_objects::TaskStatus;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn save(&self, task: &ProcessingTask) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<ProcessingTask>, RepositoryError>;

    /// Writes the task's status, error message and attempts only if the
    /// stored status still equals `expected`. Returns whether the row changed.
    async fn compare_and_set(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError>;

    async fn set_external_task_id(
        &self,
        task_id: Uuid,
        external_task_id: &str,
    ) -> Result<bool, RepositoryError>;

    async fn set_document_id(&self, task_id: Uuid, document_id: Uuid)
    -> Result<bool, RepositoryError>;

    async fn list_for_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
        task_ids: Option<&[Uuid]>,
    ) -> Result<Vec<ProcessingTask>, RepositoryError>;
}
