use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl BlobStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobStoreError::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub key: String,
    pub size: u64,
}

/// Object storage addressed by `(bucket, key)`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), BlobStoreError>;

    async fn stat(&self, bucket: &str, key: &str) -> Result<BlobInfo, BlobStoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobStoreError>;

    async fn copy(&self, bucket: &str, from: &str, to: &str) -> Result<(), BlobStoreError>;

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), BlobStoreError>;

    /// Every object whose key starts with `prefix`.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, BlobStoreError>;
}
