use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::task_coordinator::{ProcessingTaskCoordinator, TransitionOutcome};
use crate::application::ports::{
    DispatchPolicy, JobHandler, JobMessage, JobPayload, QueueHandle, TaskQueue,
};
use crate::domain::entities::ProcessingTask;
use crate::domain::value_objects::{RetryPolicy, TaskStatus};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnknownTask,
    AlreadyFinished(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    Failed(String),
    Skipped(SkipReason),
}

/// What a worker did with one delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub task_id: Uuid,
    pub attempts: u32,
    pub delays: Vec<Duration>,
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    fn skipped(task_id: Uuid, reason: SkipReason) -> Self {
        Self {
            task_id,
            attempts: 0,
            delays: Vec::new(),
            outcome: ExecutionOutcome::Skipped(reason),
        }
    }
}

/// Submits task work to the queue and runs delivered messages under their
/// dispatch policy.
pub struct AsyncDispatcher {
    queue: Arc<dyn TaskQueue>,
    coordinator: Arc<ProcessingTaskCoordinator>,
    cleanup_policy: RetryPolicy,
}

impl AsyncDispatcher {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        coordinator: Arc<ProcessingTaskCoordinator>,
        cleanup_policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            coordinator,
            cleanup_policy,
        }
    }

    pub async fn fire_and_forget(
        &self,
        task: &ProcessingTask,
        payload: JobPayload,
    ) -> IngestResult<QueueHandle> {
        self.submit(task, payload, DispatchPolicy::FireAndForget)
            .await
    }

    pub async fn with_bounded_retry(
        &self,
        task: &ProcessingTask,
        payload: JobPayload,
    ) -> IngestResult<QueueHandle> {
        self.submit(
            task,
            payload,
            DispatchPolicy::BoundedRetry(self.cleanup_policy),
        )
        .await
    }

    async fn submit(
        &self,
        task: &ProcessingTask,
        payload: JobPayload,
        policy: DispatchPolicy,
    ) -> IngestResult<QueueHandle> {
        let message = JobMessage {
            task_id: task.id(),
            payload,
            policy,
        };

        match self.queue.enqueue(message).await {
            Ok(handle) => {
                self.coordinator
                    .attach_external_handle(task.id(), &handle)
                    .await?;
                info!("Submitted {} task {} as {}", task.job_type(), task.id(), handle);
                Ok(handle)
            }
            Err(e) => {
                let reason = format!("Failed to submit task: {}", e);
                self.coordinator
                    .transition(task.id(), TaskStatus::Failed, Some(reason.clone()))
                    .await?;
                Err(IngestError::Dispatch(reason))
            }
        }
    }

    /// Worker side. Redelivered messages for finished tasks are skipped and a
    /// task left in `processing` by a crashed worker is resumed.
    pub async fn execute(
        &self,
        message: &JobMessage,
        handler: &dyn JobHandler,
    ) -> IngestResult<ExecutionReport> {
        let task_id = message.task_id;
        let Some(task) = self.coordinator.find(task_id).await? else {
            warn!("Dropping message for unknown task {}", task_id);
            return Ok(ExecutionReport::skipped(task_id, SkipReason::UnknownTask));
        };

        let resumed_attempts = match task.status() {
            TaskStatus::Completed | TaskStatus::Failed => {
                info!(
                    "Task {} is already {}, skipping redelivery",
                    task_id,
                    task.status()
                );
                return Ok(ExecutionReport::skipped(
                    task_id,
                    SkipReason::AlreadyFinished(task.status()),
                ));
            }
            TaskStatus::Processing => {
                info!("Resuming task {} after {} attempts", task_id, task.attempts());
                task.attempts().max(0) as u32
            }
            TaskStatus::Pending => {
                match self
                    .coordinator
                    .transition(task_id, TaskStatus::Processing, None)
                    .await?
                {
                    TransitionOutcome::Applied(_) => 0,
                    TransitionOutcome::Rejected {
                        from: TaskStatus::Processing,
                        ..
                    } => 0,
                    TransitionOutcome::Rejected { from, .. } => {
                        return Ok(ExecutionReport::skipped(
                            task_id,
                            SkipReason::AlreadyFinished(from),
                        ));
                    }
                    TransitionOutcome::UnknownTask => {
                        return Ok(ExecutionReport::skipped(task_id, SkipReason::UnknownTask));
                    }
                }
            }
        };

        match message.policy {
            DispatchPolicy::FireAndForget => self.run_once(message, handler).await,
            DispatchPolicy::BoundedRetry(policy) => {
                self.run_with_retry(message, handler, policy, resumed_attempts)
                    .await
            }
        }
    }

    async fn run_once(
        &self,
        message: &JobMessage,
        handler: &dyn JobHandler,
    ) -> IngestResult<ExecutionReport> {
        let task_id = message.task_id;
        let outcome = match handler.handle(message).await {
            Ok(()) => {
                self.coordinator
                    .transition(task_id, TaskStatus::Completed, None)
                    .await?;
                ExecutionOutcome::Completed
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Task {} failed: {}", task_id, reason);
                self.coordinator
                    .transition(task_id, TaskStatus::Failed, Some(reason.clone()))
                    .await?;
                ExecutionOutcome::Failed(reason)
            }
        };

        Ok(ExecutionReport {
            task_id,
            attempts: 1,
            delays: Vec::new(),
            outcome,
        })
    }

    async fn run_with_retry(
        &self,
        message: &JobMessage,
        handler: &dyn JobHandler,
        policy: RetryPolicy,
        already_attempted: u32,
    ) -> IngestResult<ExecutionReport> {
        let task_id = message.task_id;
        let mut attempts = already_attempted;
        let mut delays = Vec::new();

        while attempts < policy.max_attempts {
            let error = match handler.handle(message).await {
                Ok(()) => {
                    self.coordinator
                        .transition(task_id, TaskStatus::Completed, None)
                        .await?;
                    return Ok(ExecutionReport {
                        task_id,
                        attempts: attempts + 1,
                        delays,
                        outcome: ExecutionOutcome::Completed,
                    });
                }
                Err(e) => e.to_string(),
            };

            attempts += 1;
            self.coordinator
                .record_failed_attempt(task_id, attempts as i32, error.clone())
                .await?;

            if attempts >= policy.max_attempts {
                break;
            }

            let delay = policy.delay_for(attempts - 1);
            warn!(
                "Task {} attempt {}/{} failed: {}; retrying in {:?}",
                task_id, attempts, policy.max_attempts, error, delay
            );
            delays.push(delay);
            tokio::time::sleep(delay).await;
        }

        let task = self.coordinator.get(task_id).await?;
        let reason = task
            .error_message()
            .unwrap_or("retry budget exhausted")
            .to_string();
        self.coordinator
            .transition(task_id, TaskStatus::Failed, Some(reason.clone()))
            .await?;
        error!(
            "Task {} ({}) failed after {} attempts, manual action required: {}",
            task_id,
            task.job_type(),
            attempts,
            reason
        );

        Ok(ExecutionReport {
            task_id,
            attempts,
            delays,
            outcome: ExecutionOutcome::Failed(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{Harness, ScriptedHandler};
    use crate::domain::value_objects::JobKind;
    use std::sync::atomic::Ordering;

    fn cleanup_payload(kb_id: Uuid) -> JobPayload {
        JobPayload::CleanupKnowledgeBase {
            knowledge_base_id: kb_id,
        }
    }

    #[tokio::test]
    async fn test_submission_attaches_handle() {
        let harness = Harness::new();
        let kb_id = Uuid::new_v4();
        let task = harness
            .coordinator
            .create(kb_id, JobKind::DeleteKb, None, None)
            .await
            .unwrap();

        let handle = harness
            .dispatcher
            .with_bounded_retry(&task, cleanup_payload(kb_id))
            .await
            .unwrap();

        let stored = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.external_task_id(), Some(handle.as_str()));
        assert_eq!(stored.status(), TaskStatus::Pending);

        let sent = harness.queue.messages();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0].policy, DispatchPolicy::BoundedRetry(_)));
    }

    #[tokio::test]
    async fn test_enqueue_failure_fails_task_without_handle() {
        let harness = Harness::new();
        harness.queue.fail.store(true, Ordering::SeqCst);
        let task = harness
            .coordinator
            .create(Uuid::new_v4(), JobKind::ProcessDoc, None, None)
            .await
            .unwrap();

        let err = harness
            .dispatcher
            .fire_and_forget(&task, cleanup_payload(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Dispatch(_)));
        let stored = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Failed);
        assert!(stored.external_task_id().is_none());
    }

    #[tokio::test]
    async fn test_fire_and_forget_runs_once() {
        let harness = Harness::new();
        let task = harness
            .coordinator
            .create(Uuid::new_v4(), JobKind::ProcessDoc, None, None)
            .await
            .unwrap();
        harness
            .dispatcher
            .fire_and_forget(&task, cleanup_payload(Uuid::new_v4()))
            .await
            .unwrap();
        let message = harness.queue.messages().remove(0);
        let handler = ScriptedHandler::failing_times(1);

        let report = harness.dispatcher.execute(&message, &handler).await.unwrap();

        assert_eq!(report.attempts, 1);
        assert!(matches!(report.outcome, ExecutionOutcome::Failed(_)));
        assert_eq!(handler.calls(), 1);
        let stored = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_bounded_retry_exhausts_exact_budget() {
        let harness = Harness::new();
        let task = harness
            .coordinator
            .create(Uuid::new_v4(), JobKind::DeleteKb, None, None)
            .await
            .unwrap();
        harness
            .dispatcher
            .with_bounded_retry(&task, cleanup_payload(Uuid::new_v4()))
            .await
            .unwrap();
        let message = harness.queue.messages().remove(0);
        let handler = ScriptedHandler::always_failing();

        let report = harness.dispatcher.execute(&message, &handler).await.unwrap();

        let policy = Harness::retry_policy();
        assert_eq!(report.attempts, policy.max_attempts);
        assert_eq!(handler.calls(), policy.max_attempts);
        assert_eq!(report.delays, policy.schedule());
        let stored = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Failed);
        assert_eq!(stored.attempts(), policy.max_attempts as i32);
        assert!(stored.error_message().is_some());
    }

    #[tokio::test]
    async fn test_bounded_retry_recovers() {
        let harness = Harness::new();
        let task = harness
            .coordinator
            .create(Uuid::new_v4(), JobKind::DeleteKb, None, None)
            .await
            .unwrap();
        harness
            .dispatcher
            .with_bounded_retry(&task, cleanup_payload(Uuid::new_v4()))
            .await
            .unwrap();
        let message = harness.queue.messages().remove(0);
        let handler = ScriptedHandler::failing_times(2);

        let report = harness.dispatcher.execute(&message, &handler).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Completed);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.delays.len(), 2);
        let stored = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Completed);
        assert_eq!(stored.attempts(), 2);
    }

    #[tokio::test]
    async fn test_redelivery_of_finished_task_is_skipped() {
        let harness = Harness::new();
        let task = harness
            .coordinator
            .create(Uuid::new_v4(), JobKind::ProcessDoc, None, None)
            .await
            .unwrap();
        harness
            .dispatcher
            .fire_and_forget(&task, cleanup_payload(Uuid::new_v4()))
            .await
            .unwrap();
        let message = harness.queue.messages().remove(0);
        let handler = ScriptedHandler::failing_times(0);

        harness.dispatcher.execute(&message, &handler).await.unwrap();
        let again = harness.dispatcher.execute(&message, &handler).await.unwrap();

        assert_eq!(
            again.outcome,
            ExecutionOutcome::Skipped(SkipReason::AlreadyFinished(TaskStatus::Completed))
        );
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_task_message_is_skipped() {
        let harness = Harness::new();
        let message = JobMessage {
            task_id: Uuid::new_v4(),
            payload: cleanup_payload(Uuid::new_v4()),
            policy: DispatchPolicy::FireAndForget,
        };
        let handler = ScriptedHandler::failing_times(0);

        let report = harness.dispatcher.execute(&message, &handler).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Skipped(SkipReason::UnknownTask));
        assert_eq!(handler.calls(), 0);
    }
}
