use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkRepository, RecordedChunk, RepositoryError};
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::ChunkModel;
use crate::infrastructure::database::schema::document_chunks;

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn find_recorded(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Vec<RecordedChunk>, RepositoryError> {
        let file_name = file_name.to_string();

        let rows: Vec<(String, String)> = with_connection(&self.pool, move |conn| {
            document_chunks::table
                .filter(document_chunks::knowledge_base_id.eq(knowledge_base_id))
                .filter(document_chunks::file_name.eq(file_name))
                .select((document_chunks::id, document_chunks::hash))
                .load(conn)
                .map_err(db_error("Failed to load chunk records"))
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, hash)| RecordedChunk { id, hash })
            .collect())
    }

    async fn insert_batch(&self, chunks: &[DocumentChunk]) -> Result<usize, RepositoryError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let models: Vec<ChunkModel> = chunks.iter().map(ChunkModel::from).collect();

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(document_chunks::table)
                .values(&models)
                .on_conflict(document_chunks::id)
                .do_nothing()
                .execute(conn)
                .map_err(db_error("Failed to insert chunk records"))
        })
        .await
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();

        with_connection(&self.pool, move |conn| {
            diesel::delete(document_chunks::table.filter(document_chunks::id.eq_any(ids)))
                .execute(conn)
                .map_err(db_error("Failed to delete chunk records"))
        })
        .await
    }

    async fn count_by_document(&self, document_id: Uuid) -> Result<i64, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            document_chunks::table
                .filter(document_chunks::document_id.eq(document_id))
                .count()
                .get_result(conn)
                .map_err(db_error("Failed to count chunk records"))
        })
        .await
    }
}
