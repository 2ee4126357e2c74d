use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::MpscTaskQueueReceiver;
use crate::application::ports::JobHandler;
use crate::application::services::{AsyncDispatcher, ExecutionOutcome};

/// Fixed set of tokio workers draining one queue, one message at a time each.
pub struct WorkerPool {
    receiver: MpscTaskQueueReceiver,
    dispatcher: Arc<AsyncDispatcher>,
    handler: Arc<dyn JobHandler>,
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(
        receiver: MpscTaskQueueReceiver,
        dispatcher: Arc<AsyncDispatcher>,
        handler: Arc<dyn JobHandler>,
    ) -> Self {
        Self {
            receiver,
            dispatcher,
            handler,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Runs until the queue is closed and drained.
    pub async fn start(self) {
        info!("Starting worker pool with {} workers", self.worker_count);
        let pool = Arc::new(self);

        let handles: Vec<_> = (0..pool.worker_count)
            .map(|worker_id| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.worker_loop(worker_id).await })
            })
            .collect();

        for (worker_id, result) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!("Worker {} panicked: {}", worker_id, e);
            }
        }

        info!("Worker pool stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        info!("Worker {} started", worker_id);

        while let Some(envelope) = self.receiver.recv().await {
            let message = match envelope.decode() {
                Ok(message) => message,
                Err(e) => {
                    error!("Worker {} dropped undecodable job {}: {}", worker_id, envelope.handle, e);
                    continue;
                }
            };

            info!(
                "Worker {} picked up job {} for task {}",
                worker_id, envelope.handle, message.task_id
            );
            match self.dispatcher.execute(&message, self.handler.as_ref()).await {
                Ok(report) => match report.outcome {
                    ExecutionOutcome::Completed => info!(
                        "Task {} completed after {} attempt(s)",
                        report.task_id, report.attempts
                    ),
                    ExecutionOutcome::Failed(reason) => {
                        warn!("Task {} failed: {}", report.task_id, reason)
                    }
                    ExecutionOutcome::Skipped(reason) => {
                        info!("Task {} skipped: {:?}", report.task_id, reason)
                    }
                },
                Err(e) => error!("Worker {} could not run task {}: {}", worker_id, message.task_id, e),
            }
        }

        info!("Worker {} stopped", worker_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DispatchPolicy, JobMessage, JobPayload, TaskQueue};
    use crate::application::services::ProcessingTaskCoordinator;
    use crate::application::services::test_support::ScriptedHandler;
    use crate::domain::value_objects::{JobKind, RetryPolicy, TaskStatus};
    use crate::infrastructure::memory::MemoryStore;
    use crate::infrastructure::messaging::MpscTaskQueue;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_pool_runs_queued_tasks_to_completion() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(ProcessingTaskCoordinator::new(store));
        let (queue, receiver) = MpscTaskQueue::create_pair(8);
        // workers never submit follow-up work in this test
        let (idle_queue, _idle_receiver) = MpscTaskQueue::create_pair(1);
        let dispatcher = Arc::new(AsyncDispatcher::new(
            Arc::new(idle_queue),
            coordinator.clone(),
            RetryPolicy::default(),
        ));

        let mut task_ids = Vec::new();
        for _ in 0..3 {
            let task = coordinator
                .create(Uuid::new_v4(), JobKind::DeleteKb, None, None)
                .await
                .unwrap();
            queue
                .enqueue(JobMessage {
                    task_id: task.id(),
                    payload: JobPayload::CleanupKnowledgeBase {
                        knowledge_base_id: Uuid::new_v4(),
                    },
                    policy: DispatchPolicy::FireAndForget,
                })
                .await
                .unwrap();
            task_ids.push(task.id());
        }
        drop(queue);

        let handler = Arc::new(ScriptedHandler::failing_times(0));
        WorkerPool::new(receiver, dispatcher, handler.clone())
            .with_worker_count(2)
            .start()
            .await;

        assert_eq!(handler.calls(), 3);
        for task_id in task_ids {
            assert_eq!(
                coordinator.get(task_id).await.unwrap().status(),
                TaskStatus::Completed
            );
        }
    }
}
