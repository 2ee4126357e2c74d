pub mod chunk_fingerprint;
pub mod chunking_config;
pub mod file_hash;
pub mod job_kind;
pub mod retry_policy;
pub mod task_status;
pub mod upload_status;

pub use chunk_fingerprint::ChunkFingerprint;
pub use chunking_config::ChunkingConfig;
pub use file_hash::FileHash;
pub use job_kind::JobKind;
pub use retry_policy::RetryPolicy;
pub use task_status::TaskStatus;
pub use upload_status::UploadStatus;
