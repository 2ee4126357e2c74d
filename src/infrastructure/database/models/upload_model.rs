use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentUpload;
use crate::domain::value_objects::{FileHash, UploadStatus};
use crate::infrastructure::database::schema::document_uploads;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = document_uploads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UploadModel {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub file_size: i64,
    pub content_type: String,
    pub temp_path: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DocumentUpload> for UploadModel {
    fn from(upload: &DocumentUpload) -> Self {
        Self {
            id: upload.id(),
            knowledge_base_id: upload.knowledge_base_id(),
            file_name: upload.file_name().to_string(),
            file_hash: upload.file_hash().as_str().to_string(),
            file_size: upload.file_size(),
            content_type: upload.content_type().to_string(),
            temp_path: upload.temp_path().to_string(),
            status: upload.status().to_string(),
            error_message: upload.error_message().map(str::to_string),
            created_at: upload.created_at(),
            updated_at: upload.updated_at(),
        }
    }
}

impl TryFrom<UploadModel> for DocumentUpload {
    type Error = String;

    fn try_from(model: UploadModel) -> Result<Self, Self::Error> {
        let file_hash =
            FileHash::new(model.file_hash).map_err(|e| format!("Invalid file hash: {}", e))?;
        let status = UploadStatus::from_string(&model.status)?;

        Ok(DocumentUpload::from_database(
            model.id,
            model.knowledge_base_id,
            model.file_name,
            file_hash,
            model.file_size,
            model.content_type,
            model.temp_path,
            status,
            model.error_message,
            model.created_at,
            model.updated_at,
        ))
    }
}
