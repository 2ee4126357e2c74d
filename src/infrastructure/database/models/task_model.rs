use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::ProcessingTask;
use crate::domain::value_objects::{JobKind, TaskStatus};
use crate::infrastructure::database::schema::processing_tasks;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = processing_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskModel {
    pub id: Uuid,
    pub knowledge_base_id: Option<Uuid>,
    pub document_id: Option<Uuid>,
    pub document_upload_id: Option<Uuid>,
    pub job_type: String,
    pub status: String,
    pub external_task_id: Option<String>,
    pub error_message: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns a status transition is allowed to write.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = processing_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskTransitionModel {
    pub status: String,
    pub error_message: Option<String>,
    pub attempts: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<&ProcessingTask> for TaskModel {
    fn from(task: &ProcessingTask) -> Self {
        Self {
            id: task.id(),
            knowledge_base_id: task.knowledge_base_id(),
            document_id: task.document_id(),
            document_upload_id: task.document_upload_id(),
            job_type: task.job_type().to_string(),
            status: task.status().to_string(),
            external_task_id: task.external_task_id().map(str::to_string),
            error_message: task.error_message().map(str::to_string),
            attempts: task.attempts(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl From<&ProcessingTask> for TaskTransitionModel {
    fn from(task: &ProcessingTask) -> Self {
        Self {
            status: task.status().to_string(),
            error_message: task.error_message().map(str::to_string),
            attempts: task.attempts(),
            updated_at: task.updated_at(),
        }
    }
}

impl TryFrom<TaskModel> for ProcessingTask {
    type Error = String;

    fn try_from(model: TaskModel) -> Result<Self, Self::Error> {
        let job_type = JobKind::from_string(&model.job_type)?;
        let status = TaskStatus::from_string(&model.status)?;

        Ok(ProcessingTask::from_database(
            model.id,
            model.knowledge_base_id,
            model.document_id,
            model.document_upload_id,
            job_type,
            status,
            model.external_task_id,
            model.error_message,
            model.attempts,
            model.created_at,
            model.updated_at,
        ))
    }
}
