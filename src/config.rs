use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::value_objects::{ChunkingConfig, RetryPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

/// Process configuration read from the environment. `main` loads `.env` first.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Unset means the in-memory relational and vector adapters.
    pub database_url: Option<String>,
    pub database_pool_size: u32,
    pub blob_root: PathBuf,
    pub blob_bucket: String,
    pub embeddings_service_url: String,
    pub embedding_dimension: usize,
    pub server_port: u16,
    pub max_upload_bytes: usize,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub chunking: ChunkingConfig,
    pub vector_batch_size: usize,
    pub cleanup_retry: RetryPolicy,
    pub staging_verify_attempts: u32,
    pub staging_verify_interval: Duration,
    pub staging_ttl: chrono::Duration,
    pub staging_sweep_interval: Duration,
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        }
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let chunking = ChunkingConfig::new(
            parse_var("CHUNK_SIZE", 1000)?,
            parse_var("CHUNK_OVERLAP", 200)?,
        )
        .map_err(ConfigError::Invalid)?;

        let cleanup_retry = RetryPolicy::new(
            parse_var("CLEANUP_MAX_ATTEMPTS", 5)?,
            Duration::from_secs(parse_var("CLEANUP_BASE_DELAY_SECS", 20)?),
            Duration::from_secs(parse_var("CLEANUP_MAX_DELAY_SECS", 300)?),
        );

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            database_pool_size: parse_var("DATABASE_POOL_SIZE", 10)?,
            blob_root: PathBuf::from(env::var("BLOB_ROOT").unwrap_or_else(|_| "./blobs".to_string())),
            blob_bucket: env::var("BLOB_BUCKET").unwrap_or_else(|_| "documents".to_string()),
            embeddings_service_url: env::var("EMBEDDINGS_SERVICE_URL")
                .unwrap_or_else(|_| "https://example.workers.dev".to_string()),
            embedding_dimension: parse_var("EMBEDDING_DIMENSION", 1536)?,
            server_port: parse_var("SERVER_PORT", 3000)?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 250 * 1024 * 1024)?,
            worker_count: parse_var("WORKER_COUNT", 3)?,
            queue_capacity: parse_var("QUEUE_CAPACITY", 1024)?,
            chunking,
            vector_batch_size: parse_var("VECTOR_BATCH_SIZE", 64)?,
            cleanup_retry,
            staging_verify_attempts: parse_var("STAGING_VERIFY_ATTEMPTS", 3)?,
            staging_verify_interval: Duration::from_millis(parse_var(
                "STAGING_VERIFY_INTERVAL_MS",
                200,
            )?),
            staging_ttl: chrono::Duration::hours(parse_var("STAGING_TTL_HOURS", 24)?),
            staging_sweep_interval: Duration::from_secs(parse_var(
                "STAGING_SWEEP_INTERVAL_SECS",
                3600,
            )?),
        })
    }
}
