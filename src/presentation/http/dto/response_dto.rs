use axum::{Json, http::StatusCode};
use serde::Serialize;

use crate::error::IngestError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: String, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message,
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub type ApiReply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn respond<T>(status: StatusCode, data: T) -> ApiReply<T> {
    (status, Json(ApiResponse::success(data)))
}

pub fn status_for(error: &IngestError) -> StatusCode {
    match error {
        IngestError::Validation(_) => StatusCode::BAD_REQUEST,
        IngestError::NotFound(_) => StatusCode::NOT_FOUND,
        IngestError::Staging(_) => StatusCode::BAD_GATEWAY,
        IngestError::Processing(_)
        | IngestError::Cleanup(_)
        | IngestError::Dispatch(_)
        | IngestError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for(error: &IngestError) -> &'static str {
    match error {
        IngestError::Validation(_) => "VALIDATION_FAILED",
        IngestError::NotFound(_) => "NOT_FOUND",
        IngestError::Staging(_) => "STAGING_FAILED",
        IngestError::Processing(_) => "PROCESSING_FAILED",
        IngestError::Cleanup(_) => "CLEANUP_FAILED",
        IngestError::Dispatch(_) => "DISPATCH_FAILED",
        IngestError::Repository(_) => "STORAGE_FAILED",
    }
}

/// Error envelope for a use case failure.
pub fn failure<T>(error: IngestError) -> ApiReply<T> {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    }
    (
        status,
        Json(ApiResponse::error(
            code_for(&error).to_string(),
            error.to_string(),
            None,
        )),
    )
}

pub fn bad_request<T>(code: &str, message: impl Into<String>) -> ApiReply<T> {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(code.to_string(), message.into(), None)),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponseDto {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::RepositoryError;

    #[test]
    fn test_taxonomy_status_codes() {
        let cases = [
            (IngestError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (IngestError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (IngestError::Staging("x".into()), StatusCode::BAD_GATEWAY),
            (
                IngestError::Processing("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IngestError::Cleanup("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IngestError::Dispatch("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                IngestError::Repository(RepositoryError::Database("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{}", error);
        }
    }

    #[test]
    fn test_failure_envelope() {
        let (status, Json(body)) = failure::<()>(IngestError::NotFound("Task 1".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert!(body.data.is_none());

        let error = body.error.unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert!(error.message.contains("Task 1"));
    }
}
