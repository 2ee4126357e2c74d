use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::dispatcher::AsyncDispatcher;
use super::task_coordinator::ProcessingTaskCoordinator;
use crate::application::ports::{BlobStore, JobPayload, VectorIndex};
use crate::domain::entities::knowledge_base::{collection_name, storage_prefix};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, KnowledgeBaseRepository, UploadRepository,
};
use crate::domain::value_objects::{JobKind, TaskStatus};
use crate::error::{IngestError, IngestResult};

/// Returned once the relational deletion has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReceipt {
    pub task_id: Uuid,
    pub warnings: Vec<String>,
}

/// External cleanup still owed for one deleted document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PendingSteps {
    blob_path: Option<String>,
    purge_vectors: bool,
}

impl PendingSteps {
    fn is_done(&self) -> bool {
        self.blob_path.is_none() && !self.purge_vectors
    }
}

/// Deletes documents and knowledge bases across the relational store, the
/// blob store and the vector index.
///
/// The relational delete is transactional and authoritative. Blob and vector
/// cleanup happen afterwards; their failures are reported as warnings and
/// retried in the background.
pub struct ConsistencyCleanupOrchestrator {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    upload_repository: Arc<dyn UploadRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    blob_store: Arc<dyn BlobStore>,
    vector_index: Arc<dyn VectorIndex>,
    coordinator: Arc<ProcessingTaskCoordinator>,
    dispatcher: Arc<AsyncDispatcher>,
    bucket: String,
}

impl ConsistencyCleanupOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        upload_repository: Arc<dyn UploadRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
        blob_store: Arc<dyn BlobStore>,
        vector_index: Arc<dyn VectorIndex>,
        coordinator: Arc<ProcessingTaskCoordinator>,
        dispatcher: Arc<AsyncDispatcher>,
        bucket: String,
    ) -> Self {
        Self {
            knowledge_base_repository,
            document_repository,
            upload_repository,
            chunk_repository,
            blob_store,
            vector_index,
            coordinator,
            dispatcher,
            bucket,
        }
    }

    pub async fn delete_document(
        &self,
        kb_id: Uuid,
        document_id: Uuid,
    ) -> IngestResult<DeletionReceipt> {
        let document = self
            .document_repository
            .find_by_id(kb_id, document_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Document {}", document_id)))?;

        let upload = self
            .upload_repository
            .find_by_hash(kb_id, document.file_hash())
            .await?;
        let is_processed = self.chunk_repository.count_by_document(document_id).await? > 0;

        let task = self
            .coordinator
            .create(
                kb_id,
                JobKind::DeleteDoc,
                Some(document_id),
                upload.as_ref().map(|u| u.id()),
            )
            .await?;

        // Relational rows go first and all together.
        if let Err(e) = self
            .document_repository
            .delete_cascade(document_id, upload.as_ref().map(|u| u.id()))
            .await
        {
            self.coordinator
                .transition(
                    task.id(),
                    TaskStatus::Failed,
                    Some(format!("Failed to delete document records: {}", e)),
                )
                .await?;
            return Err(e.into());
        }

        self.coordinator
            .transition(task.id(), TaskStatus::Processing, None)
            .await?;

        let steps = PendingSteps {
            blob_path: Some(document.file_path().to_string()),
            purge_vectors: is_processed,
        };
        let (remaining, mut warnings) = self.cleanup_document(kb_id, document_id, steps).await;

        if remaining.is_done() {
            self.coordinator
                .transition(task.id(), TaskStatus::Completed, None)
                .await?;
            info!("Deleted document {} from kb {}", document_id, kb_id);
        } else {
            let payload = JobPayload::CleanupDocument {
                knowledge_base_id: kb_id,
                document_id,
                blob_path: remaining.blob_path,
                purge_vectors: remaining.purge_vectors,
            };
            if let Err(e) = self.dispatcher.with_bounded_retry(&task, payload).await {
                warnings.push(format!("Background cleanup could not be scheduled: {}", e));
            }
        }

        Ok(DeletionReceipt {
            task_id: task.id(),
            warnings,
        })
    }

    pub async fn delete_knowledge_base(&self, kb_id: Uuid) -> IngestResult<DeletionReceipt> {
        self.knowledge_base_repository
            .find_by_id(kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", kb_id)))?;

        let task = self
            .coordinator
            .create(kb_id, JobKind::DeleteKb, None, None)
            .await?;

        if let Err(e) = self.knowledge_base_repository.delete(kb_id).await {
            self.coordinator
                .transition(
                    task.id(),
                    TaskStatus::Failed,
                    Some(format!("Failed to delete knowledge base records: {}", e)),
                )
                .await?;
            return Err(e.into());
        }

        let mut warnings = Vec::new();
        let payload = JobPayload::CleanupKnowledgeBase {
            knowledge_base_id: kb_id,
        };
        if let Err(e) = self.dispatcher.with_bounded_retry(&task, payload).await {
            warnings.push(format!("Background cleanup could not be scheduled: {}", e));
        }

        info!("Deleted knowledge base {} records", kb_id);
        Ok(DeletionReceipt {
            task_id: task.id(),
            warnings,
        })
    }

    /// Body of the background cleanup jobs. Safe to run repeatedly.
    pub async fn run_cleanup(&self, payload: &JobPayload) -> IngestResult<()> {
        match payload {
            JobPayload::CleanupDocument {
                knowledge_base_id,
                document_id,
                blob_path,
                purge_vectors,
            } => {
                let steps = PendingSteps {
                    blob_path: blob_path.clone(),
                    purge_vectors: *purge_vectors,
                };
                let (remaining, warnings) = self
                    .cleanup_document(*knowledge_base_id, *document_id, steps)
                    .await;
                if remaining.is_done() {
                    Ok(())
                } else {
                    Err(IngestError::Cleanup(warnings.join("; ")))
                }
            }
            JobPayload::CleanupKnowledgeBase { knowledge_base_id } => {
                self.cleanup_knowledge_base(*knowledge_base_id).await
            }
            JobPayload::ProcessDocument { .. } => Err(IngestError::Cleanup(
                "Processing payload routed to cleanup".to_string(),
            )),
        }
    }

    async fn cleanup_document(
        &self,
        kb_id: Uuid,
        document_id: Uuid,
        steps: PendingSteps,
    ) -> (PendingSteps, Vec<String>) {
        let mut remaining = PendingSteps::default();
        let mut warnings = Vec::new();

        if let Some(path) = steps.blob_path {
            match self.blob_store.remove(&self.bucket, &path).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!("Failed to delete blob {}: {}", path, e);
                    warnings.push(format!("Failed to delete file from blob storage: {}", e));
                    remaining.blob_path = Some(path);
                }
            }
        }

        if steps.purge_vectors {
            match self
                .vector_index
                .delete_by_document(&collection_name(kb_id), document_id)
                .await
            {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!("Failed to delete vectors of document {}: {}", document_id, e);
                    warnings.push(format!("Failed to delete vector index entries: {}", e));
                    remaining.purge_vectors = true;
                }
            }
        }

        (remaining, warnings)
    }

    async fn cleanup_knowledge_base(&self, kb_id: Uuid) -> IngestResult<()> {
        let mut failures = Vec::new();

        match self.blob_store.list(&self.bucket, &storage_prefix(kb_id)).await {
            Ok(objects) => {
                for object in objects {
                    match self.blob_store.remove(&self.bucket, &object.key).await {
                        Ok(()) => {}
                        Err(e) if e.is_not_found() => {}
                        Err(e) => failures.push(format!("{}: {}", object.key, e)),
                    }
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => failures.push(format!("listing {}: {}", storage_prefix(kb_id), e)),
        }

        match self.vector_index.delete_collection(&collection_name(kb_id)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => failures.push(format!("collection {}: {}", collection_name(kb_id), e)),
        }

        if failures.is_empty() {
            info!("Cleaned up storage of knowledge base {}", kb_id);
            Ok(())
        } else {
            Err(IngestError::Cleanup(failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DispatchPolicy;
    use crate::application::services::dispatcher::ExecutionOutcome;
    use crate::application::services::test_support::Harness;
    use crate::domain::repositories::UploadRepository;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_clean_delete_completes_inline() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;

        let receipt = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();

        assert!(receipt.warnings.is_empty());
        assert!(harness.queue.messages().is_empty());
        let task = harness.coordinator.get(receipt.task_id).await.unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert!(!harness.blobs.contains(Harness::BUCKET, document.file_path()));
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 0);
    }

    #[tokio::test]
    async fn test_vector_failure_becomes_warning() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;
        harness.vectors.fail_delete.store(true, Ordering::SeqCst);

        let receipt = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();

        assert!(
            DocumentRepository::find_by_id(harness.store.as_ref(), kb.id(), document.id())
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(harness.store.count_by_document(document.id()).await.unwrap(), 0);
        assert_eq!(receipt.warnings.len(), 1);
        assert!(receipt.warnings[0].contains("vector"));

        let queued = harness.queue.messages();
        assert_eq!(queued.len(), 1);
        assert!(matches!(queued[0].policy, DispatchPolicy::BoundedRetry(_)));
        assert_eq!(
            queued[0].payload,
            JobPayload::CleanupDocument {
                knowledge_base_id: kb.id(),
                document_id: document.id(),
                blob_path: None,
                purge_vectors: true,
            }
        );
    }

    #[tokio::test]
    async fn test_blob_failure_becomes_warning() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;
        harness.blobs.fail_remove.store(true, Ordering::SeqCst);

        let receipt = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();

        assert_eq!(receipt.warnings.len(), 1);
        assert!(receipt.warnings[0].contains("blob"));
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 0);
        assert_eq!(
            harness.queue.messages()[0].payload,
            JobPayload::CleanupDocument {
                knowledge_base_id: kb.id(),
                document_id: document.id(),
                blob_path: Some(document.file_path().to_string()),
                purge_vectors: false,
            }
        );
    }

    #[tokio::test]
    async fn test_background_retry_finishes_cleanup() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;
        harness.vectors.fail_delete.store(true, Ordering::SeqCst);
        let receipt = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();
        harness.vectors.fail_delete.store(false, Ordering::SeqCst);

        let message = harness.queue.messages().remove(0);
        let report = harness
            .dispatcher
            .execute(&message, harness.router.as_ref())
            .await
            .unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Completed);
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 0);
        let task = harness.coordinator.get(receipt.task_id).await.unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_relational_failure_surfaces_error_and_deletes_nothing() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;
        harness.documents.fail_delete.store(true, Ordering::SeqCst);

        let err = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Repository(_)));
        assert!(harness.blobs.contains(Harness::BUCKET, document.file_path()));
        assert!(harness.store.count_by_document(document.id()).await.unwrap() > 0);
        let tasks = harness
            .coordinator
            .list_for_knowledge_base(kb.id(), None)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_staged_only_document_skips_vector_step() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.ingested_document(&kb, "a.txt", b"raw").await;
        harness.vectors.fail_delete.store(true, Ordering::SeqCst);

        let receipt = harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();

        assert!(receipt.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_correlated_upload_is_removed() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let (document, upload_id) = harness.processed_upload(&kb, "a.txt", b"hello world").await;

        harness
            .orchestrator
            .delete_document(kb.id(), document.id())
            .await
            .unwrap();

        assert!(
            UploadRepository::find_by_id(harness.store.as_ref(), upload_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let err = harness
            .orchestrator
            .delete_document(kb.id(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_knowledge_base_delete_defers_storage_cleanup() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let document = harness.processed_document(&kb, "a.txt", "hello world").await;

        let receipt = harness.orchestrator.delete_knowledge_base(kb.id()).await.unwrap();

        assert!(receipt.warnings.is_empty());
        assert!(
            KnowledgeBaseRepository::find_by_id(harness.store.as_ref(), kb.id())
                .await
                .unwrap()
                .is_none()
        );
        assert!(harness.blobs.contains(Harness::BUCKET, document.file_path()));

        let message = harness.queue.messages().remove(0);
        let report = harness
            .dispatcher
            .execute(&message, harness.router.as_ref())
            .await
            .unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Completed);
        assert!(harness.blobs.keys(Harness::BUCKET).is_empty());
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 0);

        // Running it again finds nothing left and still succeeds.
        assert!(harness.orchestrator.run_cleanup(&message.payload).await.is_ok());
    }

    #[tokio::test]
    async fn test_knowledge_base_cleanup_exhaustion_fails_task() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        harness.processed_document(&kb, "a.txt", "hello world").await;
        harness.blobs.fail_remove.store(true, Ordering::SeqCst);

        let receipt = harness.orchestrator.delete_knowledge_base(kb.id()).await.unwrap();
        let message = harness.queue.messages().remove(0);
        let report = harness
            .dispatcher
            .execute(&message, harness.router.as_ref())
            .await
            .unwrap();

        assert!(matches!(report.outcome, ExecutionOutcome::Failed(_)));
        assert_eq!(report.attempts, Harness::retry_policy().max_attempts);
        let task = harness.coordinator.get(receipt.task_id).await.unwrap();
        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(task.knowledge_base_id().is_none());
    }
}
