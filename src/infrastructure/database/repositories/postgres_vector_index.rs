use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use pgvector::{Vector, VectorExpressionMethods};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{
    EmbeddingProvider, ScoredEntry, VectorEntry, VectorIndex,
    VectorIndexError,
};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::{NewVectorEntryModel, VectorEntryModel};
use crate::infrastructure::database::schema::vector_entries;

/// `pgvector`-backed index. A collection is the set of rows sharing a
/// `collection` value; it exists while it has at least one row.
pub struct PgVectorIndex {
    pool: DbPool,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl PgVectorIndex {
    pub fn new(pool: DbPool, embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            pool,
            embedding_provider,
        }
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vector>, VectorIndexError> {
        self.embedding_provider
            .embed_texts(texts)
            .await
            .map_err(|e| VectorIndexError::Embedding(e.to_string()))
    }
}

fn backend(e: RepositoryError) -> VectorIndexError {
    VectorIndexError::Backend(e.to_string())
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn add(&self, collection: &str, entries: &[VectorEntry]) -> Result<(), VectorIndexError> {
        if entries.is_empty() {
            return Ok(());
        }

        let embeddings = self
            .embed(entries.iter().map(|e| e.content.clone()).collect())
            .await?;
        let rows: Vec<NewVectorEntryModel> = entries
            .iter()
            .zip(embeddings)
            .map(|(entry, embedding)| NewVectorEntryModel {
                collection: collection.to_string(),
                id: entry.id.clone(),
                document_id: entry.document_id,
                content: entry.content.clone(),
                metadata: serde_json::Value::Object(entry.metadata.clone()),
                embedding,
            })
            .collect();

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(vector_entries::table)
                .values(&rows)
                .on_conflict((vector_entries::collection, vector_entries::id))
                .do_update()
                .set((
                    vector_entries::document_id.eq(excluded(vector_entries::document_id)),
                    vector_entries::content.eq(excluded(vector_entries::content)),
                    vector_entries::metadata.eq(excluded(vector_entries::metadata)),
                    vector_entries::embedding.eq(excluded(vector_entries::embedding)),
                ))
                .execute(conn)
                .map_err(db_error("Failed to write vectors"))?;
            Ok(())
        })
        .await
        .map_err(backend)
    }

    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<usize, VectorIndexError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let collection = collection.to_string();
        let ids = ids.to_vec();

        with_connection(&self.pool, move |conn| {
            diesel::delete(
                vector_entries::table
                    .filter(vector_entries::collection.eq(collection))
                    .filter(vector_entries::id.eq_any(ids)),
            )
            .execute(conn)
            .map_err(db_error("Failed to delete vectors"))
        })
        .await
        .map_err(backend)
    }

    async fn delete_by_document(
        &self,
        collection: &str,
        document_id: Uuid,
    ) -> Result<usize, VectorIndexError> {
        let collection = collection.to_string();

        with_connection(&self.pool, move |conn| {
            diesel::delete(
                vector_entries::table
                    .filter(vector_entries::collection.eq(collection))
                    .filter(vector_entries::document_id.eq(document_id)),
            )
            .execute(conn)
            .map_err(db_error("Failed to delete document vectors"))
        })
        .await
        .map_err(backend)
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorIndexError> {
        let name = collection.to_string();

        let deleted = with_connection(&self.pool, move |conn| {
            diesel::delete(vector_entries::table.filter(vector_entries::collection.eq(name)))
                .execute(conn)
                .map_err(db_error("Failed to drop collection"))
        })
        .await
        .map_err(backend)?;

        if deleted == 0 {
            return Err(VectorIndexError::CollectionNotFound(collection.to_string()));
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, VectorIndexError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VectorIndexError::Embedding("empty embedding response".to_string()))?;
        let collection = collection.to_string();
        let limit = top_k as i64;

        let rows: Vec<(VectorEntryModel, f64)> = with_connection(&self.pool, move |conn| {
            let order_distance = vector_entries::embedding.cosine_distance(query_vector.clone());
            let distance = vector_entries::embedding.cosine_distance(query_vector);
            vector_entries::table
                .filter(vector_entries::collection.eq(collection))
                .order(order_distance)
                .limit(limit)
                .select((VectorEntryModel::as_select(), distance))
                .load(conn)
                .map_err(db_error("Failed to search vectors"))
        })
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|(row, distance)| ScoredEntry {
                id: row.id,
                document_id: row.document_id,
                content: row.content,
                metadata: match row.metadata {
                    serde_json::Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                },
                score: (1.0 - distance) as f32,
            })
            .collect())
    }
}
