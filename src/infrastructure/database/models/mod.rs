pub mod chunk_model;
pub mod document_model;
pub mod knowledge_base_model;
pub mod task_model;
pub mod upload_model;
pub mod vector_entry_model;

pub use chunk_model::*;
pub use document_model::*;
pub use knowledge_base_model::*;
pub use task_model::*;
pub use upload_model::*;
pub use vector_entry_model::*;
