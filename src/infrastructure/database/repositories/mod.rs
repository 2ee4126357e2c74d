pub mod postgres_chunk_repository;
pub mod postgres_document_repository;
pub mod postgres_knowledge_base_repository;
pub mod postgres_task_repository;
pub mod postgres_upload_repository;
pub mod postgres_vector_index;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_knowledge_base_repository::PostgresKnowledgeBaseRepository;
pub use postgres_task_repository::PostgresTaskRepository;
pub use postgres_upload_repository::PostgresUploadRepository;
pub use postgres_vector_index::PgVectorIndex;
