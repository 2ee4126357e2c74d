use async_trait::async_trait;

use crate::application::ports::{DocumentExtractionError, DocumentExtractor, ExtractedContent};

/// UTF-8 text formats passed through as-is.
pub struct PlainTextExtractor;

const SUPPORTED: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/x-markdown",
    "text/csv",
    "application/json",
];

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        content_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        if !self.can_extract(content_type) {
            return Err(DocumentExtractionError::UnsupportedFormat(
                content_type.to_string(),
            ));
        }

        let text = String::from_utf8(data.to_vec()).map_err(|e| {
            DocumentExtractionError::CorruptedFile(format!("Invalid UTF-8: {}", e))
        })?;

        Ok(ExtractedContent {
            text,
            title: None,
            page_count: None,
        })
    }

    fn can_extract(&self, content_type: &str) -> bool {
        SUPPORTED.contains(&content_type.to_lowercase().as_str())
    }
}
