use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::services::{ConsistencyCleanupOrchestrator, DeletionReceipt};
use crate::domain::entities::{Document, KnowledgeBase};
use crate::domain::repositories::{DocumentRepository, KnowledgeBaseRepository};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    pub description: Option<String>,
}

pub struct CreateKnowledgeBaseUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
}

impl CreateKnowledgeBaseUseCase {
    pub fn new(knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>) -> Self {
        Self {
            knowledge_base_repository,
        }
    }

    pub async fn execute(&self, request: CreateKnowledgeBaseRequest) -> IngestResult<KnowledgeBase> {
        let knowledge_base = KnowledgeBase::new(request.name, request.description)
            .map_err(IngestError::Validation)?;
        self.knowledge_base_repository.save(&knowledge_base).await?;
        Ok(knowledge_base)
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeBaseDetails {
    pub knowledge_base: KnowledgeBase,
    pub documents: Vec<Document>,
}

pub struct GetKnowledgeBaseUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    document_repository: Arc<dyn DocumentRepository>,
}

impl GetKnowledgeBaseUseCase {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            knowledge_base_repository,
            document_repository,
        }
    }

    pub async fn execute(&self, kb_id: Uuid) -> IngestResult<KnowledgeBaseDetails> {
        let knowledge_base = self
            .knowledge_base_repository
            .find_by_id(kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", kb_id)))?;
        let documents = self.document_repository.list_by_knowledge_base(kb_id).await?;

        Ok(KnowledgeBaseDetails {
            knowledge_base,
            documents,
        })
    }
}

pub struct ListKnowledgeBasesUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
}

impl ListKnowledgeBasesUseCase {
    pub fn new(knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>) -> Self {
        Self {
            knowledge_base_repository,
        }
    }

    pub async fn execute(&self, skip: i64, limit: i64) -> IngestResult<Vec<KnowledgeBase>> {
        if skip < 0 || !(1..=1000).contains(&limit) {
            return Err(IngestError::Validation(
                "skip must be >= 0 and limit between 1 and 1000".to_string(),
            ));
        }
        Ok(self.knowledge_base_repository.list(skip, limit).await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateKnowledgeBaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct UpdateKnowledgeBaseUseCase {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
}

impl UpdateKnowledgeBaseUseCase {
    pub fn new(knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>) -> Self {
        Self {
            knowledge_base_repository,
        }
    }

    pub async fn execute(
        &self,
        kb_id: Uuid,
        request: UpdateKnowledgeBaseRequest,
    ) -> IngestResult<KnowledgeBase> {
        let not_found = || IngestError::NotFound(format!("Knowledge base {}", kb_id));
        let mut knowledge_base = self
            .knowledge_base_repository
            .find_by_id(kb_id)
            .await?
            .ok_or_else(not_found)?;

        knowledge_base
            .apply_update(request.name, request.description)
            .map_err(IngestError::Validation)?;

        // the row may be deleted between the read and the write
        if !self.knowledge_base_repository.update(&knowledge_base).await? {
            return Err(not_found());
        }
        info!("Knowledge base updated: {}", knowledge_base.name());
        Ok(knowledge_base)
    }
}

pub struct DeleteKnowledgeBaseUseCase {
    orchestrator: Arc<ConsistencyCleanupOrchestrator>,
}

impl DeleteKnowledgeBaseUseCase {
    pub fn new(orchestrator: Arc<ConsistencyCleanupOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, kb_id: Uuid) -> IngestResult<DeletionReceipt> {
        self.orchestrator.delete_knowledge_base(kb_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryStore;

    #[tokio::test]
    async fn test_create_then_get_and_list() {
        let store = Arc::new(MemoryStore::new());
        let created = CreateKnowledgeBaseUseCase::new(store.clone())
            .execute(CreateKnowledgeBaseRequest {
                name: "handbook".to_string(),
                description: Some("HR policies".to_string()),
            })
            .await
            .unwrap();

        let details = GetKnowledgeBaseUseCase::new(store.clone(), store.clone())
            .execute(created.id())
            .await
            .unwrap();
        assert_eq!(details.knowledge_base, created);
        assert!(details.documents.is_empty());

        let listed = ListKnowledgeBasesUseCase::new(store.clone())
            .execute(0, 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_validation_error() {
        let store = Arc::new(MemoryStore::new());
        let err = CreateKnowledgeBaseUseCase::new(store)
            .execute(CreateKnowledgeBaseRequest {
                name: " ".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_knowledge_base_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = GetKnowledgeBaseUseCase::new(store.clone(), store)
            .execute(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_renames_and_keeps_documents_untouched() {
        let store = Arc::new(MemoryStore::new());
        let created = CreateKnowledgeBaseUseCase::new(store.clone())
            .execute(CreateKnowledgeBaseRequest {
                name: "handbook".to_string(),
                description: Some("HR policies".to_string()),
            })
            .await
            .unwrap();

        let updated = UpdateKnowledgeBaseUseCase::new(store.clone())
            .execute(
                created.id(),
                UpdateKnowledgeBaseRequest {
                    name: Some("people handbook".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.description(), Some("HR policies"));

        let stored = KnowledgeBaseRepository::find_by_id(store.as_ref(), created.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name(), "people handbook");
    }

    #[tokio::test]
    async fn test_update_validates_and_reports_missing() {
        let store = Arc::new(MemoryStore::new());
        let use_case = UpdateKnowledgeBaseUseCase::new(store.clone());

        let err = use_case
            .execute(Uuid::new_v4(), UpdateKnowledgeBaseRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));

        let kb = KnowledgeBase::new("docs".to_string(), None).unwrap();
        KnowledgeBaseRepository::save(store.as_ref(), &kb).await.unwrap();
        let err = use_case
            .execute(
                kb.id(),
                UpdateKnowledgeBaseRequest {
                    name: Some("  ".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }
}
