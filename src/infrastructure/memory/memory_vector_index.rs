use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::{
    EmbeddingProvider, ScoredEntry, VectorEntry, VectorIndex,
    VectorIndexError,
};

struct StoredVector {
    entry: VectorEntry,
    embedding: Vec<f32>,
}

/// Brute-force cosine index held in memory, one map per collection.
pub struct MemoryVectorIndex {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, HashMap<String, StoredVector>>>,
}

impl MemoryVectorIndex {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedding_provider,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, HashMap::len)
    }

    pub async fn contains(&self, collection: &str, id: &str) -> bool {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .is_some_and(|entries| entries.contains_key(id))
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, VectorIndexError> {
        let embeddings = self
            .embedding_provider
            .embed_texts(texts)
            .await
            .map_err(|e| VectorIndexError::Embedding(e.to_string()))?;
        Ok(embeddings.into_iter().map(|v| v.to_vec()).collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn add(&self, collection: &str, entries: &[VectorEntry]) -> Result<(), VectorIndexError> {
        if entries.is_empty() {
            return Ok(());
        }

        let embeddings = self
            .embed(entries.iter().map(|e| e.content.clone()).collect())
            .await?;

        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        for (entry, embedding) in entries.iter().zip(embeddings) {
            target.insert(
                entry.id.clone(),
                StoredVector {
                    entry: entry.clone(),
                    embedding,
                },
            );
        }
        Ok(())
    }

    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<usize, VectorIndexError> {
        let mut collections = self.collections.write().await;
        let Some(entries) = collections.get_mut(collection) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| entries.remove(id.as_str()).is_some()).count())
    }

    async fn delete_by_document(
        &self,
        collection: &str,
        document_id: Uuid,
    ) -> Result<usize, VectorIndexError> {
        let mut collections = self.collections.write().await;
        let Some(entries) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|_, stored| stored.entry.document_id != document_id);
        Ok(before - entries.len())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorIndexError> {
        let mut collections = self.collections.write().await;
        match collections.remove(collection) {
            Some(_) => Ok(()),
            None => Err(VectorIndexError::CollectionNotFound(collection.to_string())),
        }
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

        let query_embedding = self
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let collections = self.collections.read().await;
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredEntry> = entries
            .values()
            .map(|stored| ScoredEntry {
                id: stored.entry.id.clone(),
                document_id: stored.entry.document_id,
                content: stored.entry.content.clone(),
                metadata: stored.entry.metadata.clone(),
                score: cosine_similarity(&query_embedding, &stored.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::StubEmbeddingProvider;
    use serde_json::Map;

    fn entry(id: &str, document_id: Uuid, content: &str) -> VectorEntry {
        VectorEntry {
            id: id.to_string(),
            document_id,
            content: content.to_string(),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_add_and_delete_by_document() {
        let index = MemoryVectorIndex::new(Arc::new(StubEmbeddingProvider::default()));
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        index
            .add(
                "kb_1",
                &[entry("1", doc_a, "alpha"), entry("2", doc_a, "beta"), entry("3", doc_b, "gamma")],
            )
            .await
            .unwrap();

        assert_eq!(index.delete_by_document("kb_1", doc_a).await.unwrap(), 2);
        assert_eq!(index.len("kb_1").await, 1);
        assert!(index.contains("kb_1", "3").await);
    }

    #[tokio::test]
    async fn test_search_ranks_identical_text_first() {
        let index = MemoryVectorIndex::new(Arc::new(StubEmbeddingProvider::default()));
        let doc = Uuid::new_v4();
        index
            .add(
                "kb_1",
                &[entry("1", doc, "rust ownership rules"), entry("2", doc, "zzz qqq")],
            )
            .await
            .unwrap();

        let results = index
            .similarity_search("kb_1", "rust ownership rules", 1)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "1");
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let index = MemoryVectorIndex::new(Arc::new(StubEmbeddingProvider::default()));
        let err = index.delete_collection("kb_missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(index.delete_ids("kb_missing", &["x".to_string()]).await.unwrap(), 0);
    }
}
