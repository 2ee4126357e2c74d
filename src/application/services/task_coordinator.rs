use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::QueueHandle;
use crate::domain::entities::ProcessingTask;
use crate::domain::repositories::TaskRepository;
use crate::domain::value_objects::{JobKind, TaskStatus};
use crate::error::{IngestError, IngestResult};

/// Upper bound on compare-and-set retries. Every lost race means the stored
/// status moved forward, and a task can move at most twice.
const MAX_CAS_ROUNDS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(ProcessingTask),
    UnknownTask,
    Rejected { from: TaskStatus, to: TaskStatus },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }
}

/// Owns every status change of a [`ProcessingTask`].
pub struct ProcessingTaskCoordinator {
    task_repository: Arc<dyn TaskRepository>,
}

impl ProcessingTaskCoordinator {
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self { task_repository }
    }

    pub async fn create(
        &self,
        kb_id: Uuid,
        job_type: JobKind,
        document_id: Option<Uuid>,
        upload_id: Option<Uuid>,
    ) -> IngestResult<ProcessingTask> {
        let task = ProcessingTask::new(kb_id, job_type, document_id, upload_id);
        self.task_repository.save(&task).await?;
        debug!("Created {} task {}", job_type, task.id());
        Ok(task)
    }

    pub async fn attach_external_handle(
        &self,
        task_id: Uuid,
        handle: &QueueHandle,
    ) -> IngestResult<()> {
        if !self
            .task_repository
            .set_external_task_id(task_id, handle.as_str())
            .await?
        {
            warn!("Cannot attach queue handle {} to unknown task {}", handle, task_id);
        }
        Ok(())
    }

    /// Moves a task to `next`. Unknown tasks and illegal moves are reported in
    /// the outcome and logged; they never fail the call.
    pub async fn transition(
        &self,
        task_id: Uuid,
        next: TaskStatus,
        error_message: Option<String>,
    ) -> IngestResult<TransitionOutcome> {
        for _ in 0..MAX_CAS_ROUNDS {
            let Some(mut task) = self.task_repository.find_by_id(task_id).await? else {
                warn!("Status update for unknown task {} ignored", task_id);
                return Ok(TransitionOutcome::UnknownTask);
            };

            let from = task.status();
            if let Err(reason) = task.transition_to(next, error_message.clone()) {
                warn!("Task {}: {}", task_id, reason);
                return Ok(TransitionOutcome::Rejected { from, to: next });
            }

            if self.task_repository.compare_and_set(&task, from).await? {
                debug!("Task {} moved {} -> {}", task_id, from, next);
                return Ok(TransitionOutcome::Applied(task));
            }
        }

        let Some(current) = self.find(task_id).await?.map(|task| task.status()) else {
            warn!("Task {} disappeared while moving to {}", task_id, next);
            return Ok(TransitionOutcome::UnknownTask);
        };
        warn!(
            "Task {} kept changing concurrently, {} -> {} dropped",
            task_id, current, next
        );
        Ok(TransitionOutcome::Rejected {
            from: current,
            to: next,
        })
    }

    /// Stores the attempt counter of a retried task. Only a task that is
    /// still processing accepts it.
    pub async fn record_failed_attempt(
        &self,
        task_id: Uuid,
        attempts: i32,
        error_message: String,
    ) -> IngestResult<bool> {
        let Some(mut task) = self.task_repository.find_by_id(task_id).await? else {
            warn!("Attempt recorded for unknown task {} ignored", task_id);
            return Ok(false);
        };

        if let Err(reason) = task.record_failed_attempt(attempts, error_message) {
            warn!("Task {}: {}", task_id, reason);
            return Ok(false);
        }

        Ok(self
            .task_repository
            .compare_and_set(&task, TaskStatus::Processing)
            .await?)
    }

    pub async fn link_document(&self, task_id: Uuid, document_id: Uuid) -> IngestResult<()> {
        if !self
            .task_repository
            .set_document_id(task_id, document_id)
            .await?
        {
            warn!("Cannot link document {} to unknown task {}", document_id, task_id);
        }
        Ok(())
    }

    pub async fn find(&self, task_id: Uuid) -> IngestResult<Option<ProcessingTask>> {
        Ok(self.task_repository.find_by_id(task_id).await?)
    }

    pub async fn get(&self, task_id: Uuid) -> IngestResult<ProcessingTask> {
        self.find(task_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Task {}", task_id)))
    }

    pub async fn list_for_knowledge_base(
        &self,
        kb_id: Uuid,
        task_ids: Option<&[Uuid]>,
    ) -> IngestResult<Vec<ProcessingTask>> {
        Ok(self
            .task_repository
            .list_for_knowledge_base(kb_id, task_ids)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::RepositoryError;
    use crate::infrastructure::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loses every compare-and-set and stops returning the task once
    /// `visible_reads` lookups have been served.
    struct ContendedTasks {
        inner: MemoryStore,
        visible_reads: usize,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl TaskRepository for ContendedTasks {
        async fn save(&self, task: &ProcessingTask) -> Result<(), RepositoryError> {
            TaskRepository::save(&self.inner, task).await
        }

        async fn find_by_id(
            &self,
            task_id: Uuid,
        ) -> Result<Option<ProcessingTask>, RepositoryError> {
            if self.reads.fetch_add(1, Ordering::SeqCst) >= self.visible_reads {
                return Ok(None);
            }
            TaskRepository::find_by_id(&self.inner, task_id).await
        }

        async fn compare_and_set(
            &self,
            _task: &ProcessingTask,
            _expected: TaskStatus,
        ) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn set_external_task_id(
            &self,
            task_id: Uuid,
            external_task_id: &str,
        ) -> Result<bool, RepositoryError> {
            TaskRepository::set_external_task_id(&self.inner, task_id, external_task_id).await
        }

        async fn set_document_id(
            &self,
            task_id: Uuid,
            document_id: Uuid,
        ) -> Result<bool, RepositoryError> {
            TaskRepository::set_document_id(&self.inner, task_id, document_id).await
        }

        async fn list_for_knowledge_base(
            &self,
            knowledge_base_id: Uuid,
            task_ids: Option<&[Uuid]>,
        ) -> Result<Vec<ProcessingTask>, RepositoryError> {
            TaskRepository::list_for_knowledge_base(&self.inner, knowledge_base_id, task_ids).await
        }
    }

    async fn contended(visible_reads: usize) -> (ProcessingTaskCoordinator, Uuid) {
        let repository = ContendedTasks {
            inner: MemoryStore::new(),
            visible_reads,
            reads: AtomicUsize::new(0),
        };
        let task = ProcessingTask::new(Uuid::new_v4(), JobKind::ProcessDoc, None, None);
        repository.save(&task).await.unwrap();
        (ProcessingTaskCoordinator::new(Arc::new(repository)), task.id())
    }

    fn coordinator() -> ProcessingTaskCoordinator {
        ProcessingTaskCoordinator::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_happy_path() {
        let coordinator = coordinator();
        let task = coordinator
            .create(Uuid::new_v4(), JobKind::ProcessDoc, None, Some(Uuid::new_v4()))
            .await
            .unwrap();

        coordinator
            .attach_external_handle(task.id(), &QueueHandle("job-1".to_string()))
            .await
            .unwrap();
        assert!(coordinator
            .transition(task.id(), TaskStatus::Processing, None)
            .await
            .unwrap()
            .is_applied());
        assert!(coordinator
            .transition(task.id(), TaskStatus::Completed, None)
            .await
            .unwrap()
            .is_applied());

        let stored = coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Completed);
        assert_eq!(stored.external_task_id(), Some("job-1"));
    }

    #[tokio::test]
    async fn test_terminal_tasks_never_move() {
        let coordinator = coordinator();
        let task = coordinator
            .create(Uuid::new_v4(), JobKind::DeleteDoc, None, None)
            .await
            .unwrap();
        coordinator
            .transition(task.id(), TaskStatus::Failed, Some("enqueue failed".to_string()))
            .await
            .unwrap();

        for next in [TaskStatus::Pending, TaskStatus::Processing, TaskStatus::Completed] {
            let outcome = coordinator.transition(task.id(), next, None).await.unwrap();
            assert_eq!(
                outcome,
                TransitionOutcome::Rejected {
                    from: TaskStatus::Failed,
                    to: next
                }
            );
        }

        let stored = coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Failed);
        assert_eq!(stored.error_message(), Some("enqueue failed"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_a_no_op() {
        let coordinator = coordinator();
        let outcome = coordinator
            .transition(Uuid::new_v4(), TaskStatus::Processing, None)
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::UnknownTask);
        assert!(!coordinator
            .record_failed_attempt(Uuid::new_v4(), 1, "x".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failed_attempts_are_visible() {
        let coordinator = coordinator();
        let task = coordinator
            .create(Uuid::new_v4(), JobKind::DeleteKb, None, None)
            .await
            .unwrap();
        assert!(!coordinator
            .record_failed_attempt(task.id(), 1, "too early".to_string())
            .await
            .unwrap());

        coordinator
            .transition(task.id(), TaskStatus::Processing, None)
            .await
            .unwrap();
        assert!(coordinator
            .record_failed_attempt(task.id(), 2, "blob store down".to_string())
            .await
            .unwrap());

        let stored = coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.attempts(), 2);
        assert_eq!(stored.status(), TaskStatus::Processing);
        assert_eq!(stored.error_message(), Some("blob store down"));
    }

    #[tokio::test]
    async fn test_list_filters_by_ids() {
        let coordinator = coordinator();
        let kb_id = Uuid::new_v4();
        let a = coordinator
            .create(kb_id, JobKind::ProcessDoc, None, None)
            .await
            .unwrap();
        coordinator
            .create(kb_id, JobKind::ProcessDoc, None, None)
            .await
            .unwrap();

        assert_eq!(
            coordinator
                .list_for_knowledge_base(kb_id, None)
                .await
                .unwrap()
                .len(),
            2
        );
        let only_a = coordinator
            .list_for_knowledge_base(kb_id, Some(&[a.id()]))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].id(), a.id());
    }

    #[tokio::test]
    async fn test_task_vanishing_after_lost_races_is_unknown() {
        let (coordinator, task_id) = contended(MAX_CAS_ROUNDS).await;

        let outcome = coordinator
            .transition(task_id, TaskStatus::Processing, None)
            .await
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::UnknownTask);
    }

    #[tokio::test]
    async fn test_lost_races_report_current_status() {
        let (coordinator, task_id) = contended(usize::MAX).await;

        let outcome = coordinator
            .transition(task_id, TaskStatus::Processing, None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Rejected {
                from: TaskStatus::Pending,
                to: TaskStatus::Processing
            }
        );
    }
}
