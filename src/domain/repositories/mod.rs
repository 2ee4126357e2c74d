pub mod chunk_repository;
pub mod document_repository;
pub mod knowledge_base_repository;
pub mod repository_error;
pub mod task_repository;
pub mod upload_repository;

pub use chunk_repository::{ChunkRepository, RecordedChunk};
pub use document_repository::DocumentRepository;
pub use knowledge_base_repository::KnowledgeBaseRepository;
pub use repository_error::RepositoryError;
pub use task_repository::TaskRepository;
pub use upload_repository::UploadRepository;
