use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::value_objects::ChunkFingerprint;

/// Ledger row recording that a chunk is present in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: String,
    knowledge_base_id: Uuid,
    document_id: Uuid,
    file_name: String,
    chunk_metadata: Map<String, Value>,
    hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentChunk {
    pub fn new(
        fingerprint: &ChunkFingerprint,
        knowledge_base_id: Uuid,
        document_id: Uuid,
        file_name: String,
        chunk_metadata: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: fingerprint.chunk_id.clone(),
            knowledge_base_id,
            document_id,
            file_name,
            chunk_metadata,
            hash: fingerprint.content_hash.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: String,
        knowledge_base_id: Uuid,
        document_id: Uuid,
        file_name: String,
        chunk_metadata: Map<String, Value>,
        hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            document_id,
            file_name,
            chunk_metadata,
            hash,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn knowledge_base_id(&self) -> Uuid {
        self.knowledge_base_id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn chunk_metadata(&self) -> &Map<String, Value> {
        &self.chunk_metadata
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
