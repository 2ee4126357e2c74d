use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub text: String,
    pub title: Option<String>,
    pub page_count: Option<i32>,
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        content_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError>;

    fn can_extract(&self, content_type: &str) -> bool;
}
