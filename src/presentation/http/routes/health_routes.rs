use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};

use crate::presentation::http::dto::{HealthResponseDto, respond};

pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

async fn root_handler() -> impl IntoResponse {
    respond(StatusCode::OK, env!("CARGO_PKG_NAME").to_string())
}

async fn health_handler() -> impl IntoResponse {
    respond(
        StatusCode::OK,
        HealthResponseDto {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}
