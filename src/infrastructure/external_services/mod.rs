pub mod document_extractors;
pub mod inference_client;
pub mod semantic_chunking;

pub use document_extractors::CompositeDocumentExtractor;
pub use inference_client::{EmbeddingsClientConfig, InferenceClient, InferenceEmbeddingProvider};
pub use semantic_chunking::RTSplitter;
