use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::use_cases::KnowledgeBaseDetails;
use crate::domain::entities::{Document, KnowledgeBase};

#[derive(Debug, Deserialize)]
pub struct CreateKnowledgeBaseDto {
    pub name: String,
    pub description: Option<String>,
}

/// Absent fields are left as they are; `"description": ""` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateKnowledgeBaseDto {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationDto {
    #[serde(default = "default_skip")]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_skip() -> i64 {
    0
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBaseDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&KnowledgeBase> for KnowledgeBaseDto {
    fn from(knowledge_base: &KnowledgeBase) -> Self {
        Self {
            id: knowledge_base.id(),
            name: knowledge_base.name().to_string(),
            description: knowledge_base.description().map(str::to_string),
            created_at: knowledge_base.created_at().to_rfc3339(),
            updated_at: knowledge_base.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub file_hash: String,
    pub view_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Route serving the stored bytes of a document.
pub fn document_content_path(kb_id: Uuid, document_id: Uuid) -> String {
    format!("/knowledge-bases/{}/documents/{}/content", kb_id, document_id)
}

impl DocumentDto {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: document.id(),
            knowledge_base_id: document.knowledge_base_id(),
            file_name: document.file_name().to_string(),
            file_path: document.file_path().to_string(),
            file_size: document.file_size(),
            content_type: document.content_type().to_string(),
            file_hash: document.file_hash().as_str().to_string(),
            view_url: document_content_path(document.knowledge_base_id(), document.id()),
            created_at: document.created_at().to_rfc3339(),
            updated_at: document.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBaseDetailDto {
    #[serde(flatten)]
    pub knowledge_base: KnowledgeBaseDto,
    pub documents: Vec<DocumentDto>,
}

impl From<KnowledgeBaseDetails> for KnowledgeBaseDetailDto {
    fn from(details: KnowledgeBaseDetails) -> Self {
        Self {
            knowledge_base: KnowledgeBaseDto::from(&details.knowledge_base),
            documents: details
                .documents
                .iter()
                .map(DocumentDto::from_document)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KnowledgeBaseListDto {
    pub knowledge_bases: Vec<KnowledgeBaseDto>,
    pub skip: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::FileHash;

    #[test]
    fn test_document_dto_points_at_content_route() {
        let document = Document::new(
            Uuid::new_v4(),
            "a.pdf".to_string(),
            "kb_x/a.pdf".to_string(),
            3,
            "application/pdf".to_string(),
            FileHash::from_bytes(b"abc"),
        );

        let dto = DocumentDto::from_document(&document);

        assert_eq!(
            dto.view_url,
            format!(
                "/knowledge-bases/{}/documents/{}/content",
                document.knowledge_base_id(),
                document.id()
            )
        );
        assert_eq!(dto.file_path, "kb_x/a.pdf");
    }

    #[test]
    fn test_update_body_fields_are_optional() {
        let body: UpdateKnowledgeBaseDto = serde_json::from_str(r#"{"name": "renamed"}"#).unwrap();
        assert_eq!(body.name.as_deref(), Some("renamed"));
        assert!(body.description.is_none());
    }
}
