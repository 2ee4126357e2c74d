use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::ProcessingTask;

#[derive(Debug, Serialize)]
pub struct TaskDto {
    pub id: Uuid,
    pub knowledge_base_id: Option<Uuid>,
    pub document_id: Option<Uuid>,
    pub document_upload_id: Option<Uuid>,
    pub job_type: String,
    pub status: String,
    pub external_task_id: Option<String>,
    pub error_message: Option<String>,
    pub attempts: i32,
    pub is_terminal: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ProcessingTask> for TaskDto {
    fn from(task: &ProcessingTask) -> Self {
        Self {
            id: task.id(),
            knowledge_base_id: task.knowledge_base_id(),
            document_id: task.document_id(),
            document_upload_id: task.document_upload_id(),
            job_type: task.job_type().as_str().to_string(),
            status: task.status().as_str().to_string(),
            external_task_id: task.external_task_id().map(str::to_string),
            error_message: task.error_message().map(str::to_string),
            attempts: task.attempts(),
            is_terminal: task.status().is_terminal(),
            created_at: task.created_at().to_rfc3339(),
            updated_at: task.updated_at().to_rfc3339(),
        }
    }
}

/// `?task_ids=a,b,c` narrows the listing to those tasks.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub task_ids: Option<String>,
}

impl TaskListQuery {
    pub fn parse_ids(&self) -> Result<Option<Vec<Uuid>>, String> {
        let Some(raw) = self.task_ids.as_deref() else {
            return Ok(None);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Uuid::parse_str(id).map_err(|_| format!("Invalid task id: {}", id)))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListDto {
    pub tasks: Vec<TaskDto>,
}
