pub mod document;
pub mod document_chunk;
pub mod document_upload;
pub mod knowledge_base;
pub mod processing_task;

pub use document::Document;
pub use document_chunk::DocumentChunk;
pub use document_upload::DocumentUpload;
pub use knowledge_base::KnowledgeBase;
pub use processing_task::ProcessingTask;
