use async_trait::async_trait;
use lopdf::{Document, Object};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::application::ports::{DocumentExtractionError, DocumentExtractor, ExtractedContent};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Page text in page order. Pages that fail to decode are logged and skipped.
    fn extract_pdf_text(doc: &Document) -> (String, usize) {
        let pages: Vec<u32> = doc.get_pages().into_keys().collect();
        let page_count = pages.len();

        let mut extracted: Vec<(u32, Result<String, String>)> = pages
            .into_par_iter()
            .map(|page_num| {
                let text = doc.extract_text(&[page_num]).map_err(|e| {
                    format!("Failed to extract text from page {}: {}", page_num, e)
                });
                (page_num, text)
            })
            .collect();
        extracted.sort_by_key(|(page_num, _)| *page_num);

        let mut lines = Vec::new();
        for (_, result) in extracted {
            match result {
                Ok(text) => lines.extend(
                    text.split('\n')
                        .map(str::trim_end)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                ),
                Err(e) => tracing::warn!("{}", e),
            }
        }

        (lines.join("\n"), page_count)
    }

    fn extract_title(doc: &Document) -> Option<String> {
        let info = match doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => doc.get_dictionary(*id).ok()?,
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        let title = info.get(b"Title").and_then(Object::as_str).ok()?;
        let title = String::from_utf8_lossy(title).trim().to_string();
        (!title.is_empty()).then_some(title)
    }

    fn extract_blocking(data: &[u8]) -> Result<ExtractedContent, DocumentExtractionError> {
        let doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(DocumentExtractionError::ExtractionFailed(
                "Encrypted PDFs are not supported".to_string(),
            ));
        }

        let (text, page_count) = Self::extract_pdf_text(&doc);
        Ok(ExtractedContent {
            text,
            title: Self::extract_title(&doc),
            page_count: Some(page_count as i32),
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
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

        let data = data.to_vec();
        tokio::task::spawn_blocking(move || Self::extract_blocking(&data))
            .await
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?
    }

    fn can_extract(&self, content_type: &str) -> bool {
        content_type.eq_ignore_ascii_case("application/pdf")
    }
}
