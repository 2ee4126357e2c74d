pub mod document_dto;
pub mod knowledge_base_dto;
pub mod response_dto;
pub mod search_dto;
pub mod task_dto;

pub use document_dto::*;
pub use knowledge_base_dto::*;
pub use response_dto::*;
pub use search_dto::*;
pub use task_dto::*;
