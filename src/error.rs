use thiserror::Error;

use crate::domain::repositories::RepositoryError;

/// Failure taxonomy surfaced by every use case.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Staging error: {0}")]
    Staging(String),
    #[error("Processing error: {0}")]
    Processing(String),
    #[error("Cleanup error: {0}")]
    Cleanup(String),
    #[error("Dispatch error: {0}")]
    Dispatch(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type IngestResult<T> = Result<T, IngestError>;
