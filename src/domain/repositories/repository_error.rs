use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Conversion error: {0}")]
    Conversion(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}
