use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{GetTaskStatusUseCase, ListTasksRequest, ListTasksUseCase};
use crate::presentation::http::dto::{
    ApiReply, TaskDto, TaskListDto, TaskListQuery, bad_request, failure, respond,
};

pub struct TaskHandler {
    get_task_status_use_case: Arc<GetTaskStatusUseCase>,
    list_tasks_use_case: Arc<ListTasksUseCase>,
}

impl TaskHandler {
    pub fn new(
        get_task_status_use_case: Arc<GetTaskStatusUseCase>,
        list_tasks_use_case: Arc<ListTasksUseCase>,
    ) -> Self {
        Self {
            get_task_status_use_case,
            list_tasks_use_case,
        }
    }

    pub async fn get_task_status(
        State(handler): State<Arc<TaskHandler>>,
        Path(task_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_task_status_use_case.execute(task_id).await {
            Ok(task) => Ok(respond(StatusCode::OK, TaskDto::from(&task))),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn list_tasks(
        State(handler): State<Arc<TaskHandler>>,
        Path(kb_id): Path<Uuid>,
        Query(query): Query<TaskListQuery>,
    ) -> Result<ApiReply<TaskListDto>, StatusCode> {
        let task_ids = match query.parse_ids() {
            Ok(ids) => ids,
            Err(message) => return Ok(bad_request("INVALID_TASK_ID", message)),
        };

        match handler
            .list_tasks_use_case
            .execute(ListTasksRequest { kb_id, task_ids })
            .await
        {
            Ok(tasks) => Ok(respond(
                StatusCode::OK,
                TaskListDto {
                    tasks: tasks.iter().map(TaskDto::from).collect(),
                },
            )),
            Err(e) => Ok(failure(e)),
        }
    }
}
