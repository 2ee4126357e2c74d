use axum::{Router, routing::get};
use std::sync::Arc;

use crate::presentation::http::handlers::TaskHandler;

pub fn task_routes(task_handler: Arc<TaskHandler>) -> Router {
    Router::new()
        .route("/tasks/{task_id}", get(TaskHandler::get_task_status))
        .route("/knowledge-bases/{kb_id}/tasks", get(TaskHandler::list_tasks))
        .with_state(task_handler)
}
