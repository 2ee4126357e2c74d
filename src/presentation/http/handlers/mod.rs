pub mod document_handler;
pub mod knowledge_base_handler;
pub mod search_handler;
pub mod task_handler;

pub use document_handler::{DocumentHandler, DocumentUseCases};
pub use knowledge_base_handler::KnowledgeBaseHandler;
pub use search_handler::SearchHandler;
pub use task_handler::TaskHandler;
