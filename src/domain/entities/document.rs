use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::FileHash;

/// A file that finished processing and lives at its permanent blob location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    knowledge_base_id: Uuid,
    file_name: String,
    file_path: String,
    file_size: i64,
    content_type: String,
    file_hash: FileHash,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        knowledge_base_id: Uuid,
        file_name: String,
        file_path: String,
        file_size: i64,
        content_type: String,
        file_hash: FileHash,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            knowledge_base_id,
            file_name,
            file_path,
            file_size,
            content_type,
            file_hash,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        knowledge_base_id: Uuid,
        file_name: String,
        file_path: String,
        file_size: i64,
        content_type: String,
        file_hash: FileHash,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            file_name,
            file_path,
            file_size,
            content_type,
            file_hash,
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

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn file_hash(&self) -> &FileHash {
        &self.file_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// A re-upload under the same name replaces the stored content in place.
    pub fn replace_content(
        &mut self,
        file_path: String,
        file_size: i64,
        content_type: String,
        file_hash: FileHash,
    ) {
        self.file_path = file_path;
        self.file_size = file_size;
        self.content_type = content_type;
        self.file_hash = file_hash;
        self.updated_at = Utc::now();
    }
}
