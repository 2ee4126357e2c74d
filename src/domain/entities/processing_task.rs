use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{JobKind, TaskStatus};

/// Tracks one unit of asynchronous work from submission to a terminal state.
///
/// Foreign keys are optional because tasks outlive the knowledge base,
/// document and upload they refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTask {
    id: Uuid,
    knowledge_base_id: Option<Uuid>,
    document_id: Option<Uuid>,
    document_upload_id: Option<Uuid>,
    job_type: JobKind,
    status: TaskStatus,
    external_task_id: Option<String>,
    error_message: Option<String>,
    attempts: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProcessingTask {
    pub fn new(
        knowledge_base_id: Uuid,
        job_type: JobKind,
        document_id: Option<Uuid>,
        document_upload_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            knowledge_base_id: Some(knowledge_base_id),
            document_id,
            document_upload_id,
            job_type,
            status: TaskStatus::Pending,
            external_task_id: None,
            error_message: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        knowledge_base_id: Option<Uuid>,
        document_id: Option<Uuid>,
        document_upload_id: Option<Uuid>,
        job_type: JobKind,
        status: TaskStatus,
        external_task_id: Option<String>,
        error_message: Option<String>,
        attempts: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            document_id,
            document_upload_id,
            job_type,
            status,
            external_task_id,
            error_message,
            attempts,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn knowledge_base_id(&self) -> Option<Uuid> {
        self.knowledge_base_id
    }

    pub fn document_id(&self) -> Option<Uuid> {
        self.document_id
    }

    pub fn document_upload_id(&self) -> Option<Uuid> {
        self.document_upload_id
    }

    pub fn job_type(&self) -> JobKind {
        self.job_type
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn external_task_id(&self) -> Option<&str> {
        self.external_task_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn attempts(&self) -> i32 {
        self.attempts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Business logic methods
    pub fn transition_to(
        &mut self,
        next: TaskStatus,
        error_message: Option<String>,
    ) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Illegal task transition: {} -> {}",
                self.status, next
            ));
        }

        self.status = next;
        if error_message.is_some() {
            self.error_message = error_message;
        } else if next == TaskStatus::Completed {
            self.error_message = None;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a failed attempt of a retried task that is still running.
    pub fn record_failed_attempt(&mut self, attempts: i32, error: String) -> Result<(), String> {
        if !self.status.is_processing() {
            return Err(format!(
                "Attempts can only be recorded while processing, task is {}",
                self.status
            ));
        }

        self.attempts = attempts;
        self.error_message = Some(error);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn attach_external_handle(&mut self, handle: String) {
        self.external_task_id = Some(handle);
        self.updated_at = Utc::now();
    }

    pub fn link_document(&mut self, document_id: Uuid) {
        self.document_id = Some(document_id);
        self.updated_at = Utc::now();
    }

    /// Drops references to rows that no longer exist.
    pub fn detach(&mut self, knowledge_base: bool, document: bool, upload: bool) {
        if knowledge_base {
            self.knowledge_base_id = None;
        }
        if document {
            self.document_id = None;
        }
        if upload {
            self.document_upload_id = None;
        }
    }
}
