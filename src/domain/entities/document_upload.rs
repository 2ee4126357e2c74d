use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{FileHash, UploadStatus};

/// A file accepted into staging, waiting to be processed into a [`Document`].
///
/// [`Document`]: super::Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpload {
    id: Uuid,
    knowledge_base_id: Uuid,
    file_name: String,
    file_hash: FileHash,
    file_size: i64,
    content_type: String,
    temp_path: String,
    status: UploadStatus,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentUpload {
    /// The id is chosen by the caller because it is part of the staged blob key.
    pub fn new(
        id: Uuid,
        knowledge_base_id: Uuid,
        file_name: String,
        file_hash: FileHash,
        file_size: i64,
        content_type: String,
        temp_path: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            knowledge_base_id,
            file_name,
            file_hash,
            file_size,
            content_type,
            temp_path,
            status: UploadStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        knowledge_base_id: Uuid,
        file_name: String,
        file_hash: FileHash,
        file_size: i64,
        content_type: String,
        temp_path: String,
        status: UploadStatus,
        error_message: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            file_name,
            file_hash,
            file_size,
            content_type,
            temp_path,
            status,
            error_message,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn knowledge_base_id(&self) -> Uuid {
        self.knowledge_base_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_hash(&self) -> &FileHash {
        &self.file_hash
    }

    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn temp_path(&self) -> &str {
        &self.temp_path
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, UploadStatus::Completed | UploadStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_upload_is_pending() {
        let upload = DocumentUpload::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "notes.txt".to_string(),
            FileHash::from_bytes(b"notes"),
            5,
            "text/plain".to_string(),
            "kb_x/temp/notes.txt".to_string(),
        );

        assert_eq!(upload.status(), UploadStatus::Pending);
        assert!(upload.error_message().is_none());
        assert!(!upload.is_settled());
    }
}
