pub mod document_routes;
pub mod health_routes;
pub mod knowledge_base_routes;
pub mod search_routes;
pub mod task_routes;

pub use document_routes::*;
pub use health_routes::*;
pub use knowledge_base_routes::*;
pub use search_routes::*;
pub use task_routes::*;
