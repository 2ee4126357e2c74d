pub mod blob_store;
pub mod document_extractor;
pub mod embedding_provider;
pub mod task_queue;
pub mod text_splitter;
pub mod vector_index;

pub use blob_store::{BlobInfo, BlobStore, BlobStoreError};
pub use document_extractor::{DocumentExtractionError, DocumentExtractor, ExtractedContent};
pub use embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};
pub use task_queue::{
    DispatchPolicy, JobHandler, JobMessage, JobPayload, QueueError, QueueHandle, TaskQueue,
};
pub use text_splitter::{TextChunk, TextSplitter};
pub use vector_index::{ScoredEntry, VectorEntry, VectorIndex, VectorIndexError};
