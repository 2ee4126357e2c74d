use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::infrastructure::database::schema::document_chunks;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: String,
    pub knowledge_base_id: Uuid,
    pub document_id: Uuid,
    pub file_name: String,
    pub chunk_metadata: serde_json::Value,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DocumentChunk> for ChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            id: chunk.id().to_string(),
            knowledge_base_id: chunk.knowledge_base_id(),
            document_id: chunk.document_id(),
            file_name: chunk.file_name().to_string(),
            chunk_metadata: serde_json::Value::Object(chunk.chunk_metadata().clone()),
            hash: chunk.hash().to_string(),
            created_at: chunk.created_at(),
            updated_at: chunk.updated_at(),
        }
    }
}

impl TryFrom<ChunkModel> for DocumentChunk {
    type Error = String;

    fn try_from(model: ChunkModel) -> Result<Self, Self::Error> {
        let serde_json::Value::Object(chunk_metadata) = model.chunk_metadata else {
            return Err(format!("Chunk {} metadata is not an object", model.id));
        };

        Ok(DocumentChunk::from_database(
            model.id,
            model.knowledge_base_id,
            model.document_id,
            model.file_name,
            chunk_metadata,
            model.hash,
            model.created_at,
            model.updated_at,
        ))
    }
}
