pub mod browse_documents;
pub mod expire_staged_uploads;
pub mod get_task_status;
pub mod list_tasks;
pub mod manage_knowledge_bases;
pub mod preview_document;
pub mod search_knowledge_base;
pub mod submit_deletion;
pub mod submit_processing;
pub mod submit_upload;
pub mod upload_and_process;

pub use browse_documents::{
    DocumentDetails, DocumentFile, GetDocumentUseCase, ListUploadsUseCase, ReadDocumentFileUseCase,
};
pub use expire_staged_uploads::ExpireStagedUploadsUseCase;
pub use get_task_status::GetTaskStatusUseCase;
pub use list_tasks::{ListTasksRequest, ListTasksUseCase};
pub use manage_knowledge_bases::{
    CreateKnowledgeBaseRequest, CreateKnowledgeBaseUseCase, DeleteKnowledgeBaseUseCase,
    GetKnowledgeBaseUseCase, KnowledgeBaseDetails, ListKnowledgeBasesUseCase,
    UpdateKnowledgeBaseRequest, UpdateKnowledgeBaseUseCase,
};
pub use preview_document::{PreviewDocumentRequest, PreviewDocumentResponse, PreviewDocumentUseCase};
pub use search_knowledge_base::{SearchKnowledgeBaseUseCase, SearchRequest};
pub use submit_deletion::SubmitDeletionUseCase;
pub use submit_processing::{
    SubmitProcessingRequest, SubmitProcessingResponse, SubmitProcessingUseCase, TaskSubmission,
};
pub use submit_upload::{SubmitUploadRequest, SubmitUploadResponse, SubmitUploadUseCase};
pub use upload_and_process::{UploadAndProcessResponse, UploadAndProcessUseCase};
