use async_trait::async_trait;
use std::sync::Arc;

use super::{HtmlExtractor, PdfExtractor, PlainTextExtractor};
use crate::application::ports::{DocumentExtractionError, DocumentExtractor, ExtractedContent};

/// Routes each content type to the first extractor that accepts it.
pub struct CompositeDocumentExtractor {
    extractors: Vec<Arc<dyn DocumentExtractor>>,
}

impl CompositeDocumentExtractor {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Arc::new(PdfExtractor::new()),
                Arc::new(HtmlExtractor::new()),
                Arc::new(PlainTextExtractor),
            ],
        }
    }

    fn get_extractor_for_type(&self, content_type: &str) -> Option<&Arc<dyn DocumentExtractor>> {
        self.extractors
            .iter()
            .find(|extractor| extractor.can_extract(content_type))
    }
}

impl Default for CompositeDocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `text/html; charset=utf-8` -> `text/html`
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

#[async_trait]
impl DocumentExtractor for CompositeDocumentExtractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        content_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        let content_type = essence(content_type);
        let extractor = self
            .get_extractor_for_type(&content_type)
            .ok_or_else(|| DocumentExtractionError::UnsupportedFormat(content_type.clone()))?;

        extractor.extract_text_from_bytes(data, &content_type).await
    }

    fn can_extract(&self, content_type: &str) -> bool {
        self.get_extractor_for_type(&essence(content_type)).is_some()
    }
}
