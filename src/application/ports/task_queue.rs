use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{ChunkingConfig, RetryPolicy};
use crate::error::IngestError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Task queue is full")]
    Full,
    #[error("Task queue is closed")]
    Closed,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Identifier the queue assigned to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueHandle(pub String);

impl QueueHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchPolicy {
    FireAndForget,
    BoundedRetry(RetryPolicy),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    ProcessDocument {
        knowledge_base_id: Uuid,
        upload_id: Uuid,
        chunking: ChunkingConfig,
    },
    /// Only the steps that still need doing are set.
    CleanupDocument {
        knowledge_base_id: Uuid,
        document_id: Uuid,
        blob_path: Option<String>,
        purge_vectors: bool,
    },
    CleanupKnowledgeBase {
        knowledge_base_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub task_id: Uuid,
    pub payload: JobPayload,
    pub policy: DispatchPolicy,
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, message: JobMessage) -> Result<QueueHandle, QueueError>;
}

/// Worker-side body of a job. Called once per attempt.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, message: &JobMessage) -> Result<(), IngestError>;
}
