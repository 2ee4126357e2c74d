use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::value_objects::FileHash;
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub file_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            knowledge_base_id: document.knowledge_base_id(),
            file_name: document.file_name().to_string(),
            file_path: document.file_path().to_string(),
            file_size: document.file_size(),
            content_type: document.content_type().to_string(),
            file_hash: document.file_hash().as_str().to_string(),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
        }
    }
}

impl TryFrom<DocumentModel> for Document {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let file_hash =
            FileHash::new(model.file_hash).map_err(|e| format!("Invalid file hash: {}", e))?;

        Ok(Document::from_database(
            model.id,
            model.knowledge_base_id,
            model.file_name,
            model.file_path,
            model.file_size,
            model.content_type,
            file_hash,
            model.created_at,
            model.updated_at,
        ))
    }
}
