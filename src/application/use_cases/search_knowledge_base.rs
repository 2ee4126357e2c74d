use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{ScoredEntry, VectorIndex};
use crate::domain::entities::knowledge_base::collection_name;
use crate::domain::repositories::KnowledgeBaseRepository;
use crate::error::{IngestError, IngestResult};

const MAX_TOP_K: usize = 100;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub kb_id: Uuid,
    pub query: String,
    pub top_k: usize,
}

pub struct SearchKnowledgeBaseUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    vector_index: Arc<dyn VectorIndex>,
}

impl SearchKnowledgeBaseUseCase {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            knowledge_base_repository,
            vector_index,
        }
    }

    pub async fn execute(&self, request: SearchRequest) -> IngestResult<Vec<ScoredEntry>> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(IngestError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }
        if request.top_k == 0 || request.top_k > MAX_TOP_K {
            return Err(IngestError::Validation(format!(
                "top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }

        self.knowledge_base_repository
            .find_by_id(request.kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", request.kb_id)))?;

        self.vector_index
            .similarity_search(&collection_name(request.kb_id), query, request.top_k)
            .await
            .map_err(|e| IngestError::Processing(format!("Search failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::Harness;

    #[tokio::test]
    async fn test_search_finds_indexed_chunk() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        harness
            .processed_document(&kb, "faq.txt", "how do I reset my password")
            .await;
        let use_case = SearchKnowledgeBaseUseCase::new(harness.store.clone(), harness.vectors.clone());

        let results = use_case
            .execute(SearchRequest {
                kb_id: kb.id(),
                query: "how do I reset my password".to_string(),
                top_k: 3,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "how do I reset my password");
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let harness = Harness::new();
        let use_case = SearchKnowledgeBaseUseCase::new(harness.store.clone(), harness.vectors.clone());
        let err = use_case
            .execute(SearchRequest {
                kb_id: Uuid::new_v4(),
                query: "  ".to_string(),
                top_k: 3,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }
}
