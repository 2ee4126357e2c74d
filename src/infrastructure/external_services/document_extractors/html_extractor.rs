use async_trait::async_trait;
use html2text::from_read;
use regex::Regex;
use std::sync::OnceLock;

use crate::application::ports::{DocumentExtractionError, DocumentExtractor, ExtractedContent};

const TEXT_WIDTH: usize = 80;

pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for HtmlExtractor {
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

        let html_content = std::str::from_utf8(data).map_err(|e| {
            DocumentExtractionError::CorruptedFile(format!("Invalid UTF-8: {}", e))
        })?;

        let text = from_read(html_content.as_bytes(), TEXT_WIDTH).map_err(|e| {
            DocumentExtractionError::ExtractionFailed(format!(
                "Failed to convert HTML to text: {}",
                e
            ))
        })?;

        Ok(ExtractedContent {
            text,
            title: extract_title_from_html(html_content),
            page_count: Some(1),
        })
    }

    fn can_extract(&self, content_type: &str) -> bool {
        matches!(
            content_type.to_lowercase().as_str(),
            "text/html" | "application/html" | "text/htm" | "application/xhtml+xml"
        )
    }
}

fn extract_title_from_html(html: &str) -> Option<String> {
    static TITLE: OnceLock<Option<Regex>> = OnceLock::new();
    TITLE
        .get_or_init(|| Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").ok())
        .as_ref()?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_text_and_title() {
        let html = b"<html><head><title> Release notes </title></head>\
            <body><h1>Version 2</h1><p>Faster uploads.</p></body></html>";

        let content = HtmlExtractor::new()
            .extract_text_from_bytes(html, "text/html")
            .await
            .unwrap();

        assert_eq!(content.title.as_deref(), Some("Release notes"));
        assert!(content.text.contains("Version 2"));
        assert!(content.text.contains("Faster uploads."));
        assert!(!content.text.contains("<p>"));
    }

    #[tokio::test]
    async fn test_rejects_other_types() {
        let err = HtmlExtractor::new()
            .extract_text_from_bytes(b"plain", "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentExtractionError::UnsupportedFormat(_)));
    }
}
