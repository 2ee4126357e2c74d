use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::chunk_synchronizer::{ChunkSynchronizer, SyncReport, SyncTarget};
use super::task_coordinator::ProcessingTaskCoordinator;
use super::upload_staging::UploadStagingManager;
use crate::application::ports::{BlobStore, DocumentExtractor};
use crate::domain::entities::{Document, DocumentUpload};
use crate::domain::repositories::{DocumentRepository, UploadRepository};
use crate::domain::value_objects::{ChunkingConfig, UploadStatus};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDocument {
    pub document: Document,
    pub sync: SyncReport,
}

/// Turns a staged upload into an indexed [`Document`].
pub struct DocumentProcessor {
    upload_repository: Arc<dyn UploadRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    blob_store: Arc<dyn BlobStore>,
    document_extractor: Arc<dyn DocumentExtractor>,
    staging: Arc<UploadStagingManager>,
    synchronizer: Arc<ChunkSynchronizer>,
    coordinator: Arc<ProcessingTaskCoordinator>,
    bucket: String,
}

impl DocumentProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upload_repository: Arc<dyn UploadRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        blob_store: Arc<dyn BlobStore>,
        document_extractor: Arc<dyn DocumentExtractor>,
        staging: Arc<UploadStagingManager>,
        synchronizer: Arc<ChunkSynchronizer>,
        coordinator: Arc<ProcessingTaskCoordinator>,
        bucket: String,
    ) -> Self {
        Self {
            upload_repository,
            document_repository,
            blob_store,
            document_extractor,
            staging,
            synchronizer,
            coordinator,
            bucket,
        }
    }

    pub async fn process(
        &self,
        task_id: Uuid,
        upload_id: Uuid,
        chunking: &ChunkingConfig,
    ) -> IngestResult<ProcessedDocument> {
        let upload = self
            .upload_repository
            .find_by_id(upload_id)
            .await?
            .ok_or_else(|| IngestError::Processing(format!("Upload {} not found", upload_id)))?;

        self.upload_repository
            .update_status(upload_id, UploadStatus::Processing, None)
            .await?;

        match self.ingest(&upload, chunking).await {
            Ok(processed) => {
                self.upload_repository
                    .update_status(upload_id, UploadStatus::Completed, None)
                    .await?;
                self.coordinator
                    .link_document(task_id, processed.document.id())
                    .await?;
                info!(
                    "Processed {} into document {} ({} chunks added, {} removed)",
                    upload.file_name(),
                    processed.document.id(),
                    processed.sync.added,
                    processed.sync.deleted
                );
                Ok(processed)
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(update_err) = self
                    .upload_repository
                    .update_status(upload_id, UploadStatus::Failed, Some(reason.clone()))
                    .await
                {
                    warn!("Failed to mark upload {} failed: {}", upload_id, update_err);
                }
                self.discard_staged(&upload).await;
                Err(match e {
                    IngestError::Validation(_) | IngestError::Processing(_) => e,
                    _ => IngestError::Processing(reason),
                })
            }
        }
    }

    async fn ingest(
        &self,
        upload: &DocumentUpload,
        chunking: &ChunkingConfig,
    ) -> IngestResult<ProcessedDocument> {
        self.staging
            .verify(upload.temp_path(), upload.file_size())
            .await;

        let data = self
            .blob_store
            .get(&self.bucket, upload.temp_path())
            .await
            .map_err(|e| IngestError::Processing(format!("Failed to read staged file: {}", e)))?;

        let extracted = self
            .document_extractor
            .extract_text_from_bytes(&data, upload.content_type())
            .await
            .map_err(|e| IngestError::Processing(e.to_string()))?;

        if extracted.text.trim().is_empty() {
            return Err(IngestError::Processing(format!(
                "No text could be extracted from {}",
                upload.file_name()
            )));
        }

        let permanent_path = format!("kb_{}/{}", upload.knowledge_base_id(), upload.file_name());
        let incoming = Document::new(
            upload.knowledge_base_id(),
            upload.file_name().to_string(),
            permanent_path.clone(),
            upload.file_size(),
            upload.content_type().to_string(),
            upload.file_hash().clone(),
        );

        // The row keeps its previous hash until the new chunks are indexed,
        // so a failed run never makes staging report the content as present.
        let previous = self
            .document_repository
            .find_by_name(upload.knowledge_base_id(), upload.file_name())
            .await?;
        let anchor = match &previous {
            Some(existing) => existing.clone(),
            None => self.document_repository.upsert(&incoming).await?,
        };

        let target = SyncTarget {
            kb_id: upload.knowledge_base_id(),
            document_id: anchor.id(),
            file_name: upload.file_name().to_string(),
        };
        let committed = self
            .commit(upload, &target, &extracted.text, chunking, &permanent_path, &incoming)
            .await;

        match committed {
            Ok((document, sync)) => {
                self.discard_staged(upload).await;
                Ok(ProcessedDocument { document, sync })
            }
            Err(e) => {
                if previous.is_none() {
                    self.forget_new_document(&target).await;
                }
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        upload: &DocumentUpload,
        target: &SyncTarget,
        text: &str,
        chunking: &ChunkingConfig,
        permanent_path: &str,
        incoming: &Document,
    ) -> IngestResult<(Document, SyncReport)> {
        let sync = self.synchronizer.synchronize(target, text, chunking).await?;

        self.blob_store
            .copy(&self.bucket, upload.temp_path(), permanent_path)
            .await
            .map_err(|e| IngestError::Processing(format!("Failed to store document: {}", e)))?;

        let document = self.document_repository.upsert(incoming).await?;
        Ok((document, sync))
    }

    async fn forget_new_document(&self, target: &SyncTarget) {
        if let Err(e) = self.synchronizer.discard(target).await {
            warn!(
                "Failed to drop vectors of unfinished document {}: {}",
                target.document_id, e
            );
        }
        if let Err(e) = self
            .document_repository
            .delete_cascade(target.document_id, None)
            .await
        {
            warn!(
                "Failed to drop unfinished document {}: {}",
                target.document_id, e
            );
        }
    }

    async fn discard_staged(&self, upload: &DocumentUpload) {
        match self.blob_store.remove(&self.bucket, upload.temp_path()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!("Failed to remove staged file {}: {}", upload.temp_path(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::upload_staging::StageOutcome;
    use crate::application::services::test_support::Harness;
    use crate::domain::repositories::ChunkRepository;
    use crate::domain::value_objects::{FileHash, JobKind};
    use std::sync::atomic::Ordering;

    fn letters(len: usize) -> String {
        (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect()
    }

    #[tokio::test]
    async fn test_process_staged_upload() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let StageOutcome::Pending {
            upload_id,
            temp_path,
        } = harness
            .staging
            .stage(kb.id(), "guide.txt", None, letters(250).as_bytes())
            .await
            .unwrap()
        else {
            panic!("expected a pending upload");
        };
        let task = harness
            .coordinator
            .create(kb.id(), JobKind::ProcessDoc, None, Some(upload_id))
            .await
            .unwrap();

        let processed = harness
            .processor
            .process(task.id(), upload_id, &ChunkingConfig::new(100, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(processed.sync.added, 3);
        assert_eq!(
            processed.document.file_path(),
            format!("kb_{}/guide.txt", kb.id())
        );
        assert!(!harness.blobs.contains(Harness::BUCKET, &temp_path));
        assert!(harness.blobs.contains(Harness::BUCKET, processed.document.file_path()));

        let upload = UploadRepository::find_by_id(harness.store.as_ref(), upload_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upload.status(), UploadStatus::Completed);
        let task = harness.coordinator.get(task.id()).await.unwrap();
        assert_eq!(task.document_id(), Some(processed.document.id()));
    }

    #[tokio::test]
    async fn test_reupload_reuses_document_and_diffs_chunks() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let (first, _) = harness
            .processed_upload(&kb, "notes.txt", "a".repeat(200).as_bytes())
            .await;

        let mut changed = "a".repeat(100);
        changed.push_str(&"b".repeat(100));
        let (second, _) = harness
            .processed_upload(&kb, "notes.txt", changed.as_bytes())
            .await;

        assert_eq!(first.id(), second.id());
        assert_eq!(harness.store.count_by_document(first.id()).await.unwrap(), 2);
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 2);
    }

    #[tokio::test]
    async fn test_failure_marks_upload_failed_and_discards_blob() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let StageOutcome::Pending {
            upload_id,
            temp_path,
        } = harness
            .staging
            .stage(kb.id(), "empty.txt", None, &b"   "[..])
            .await
            .unwrap()
        else {
            panic!("expected a pending upload");
        };

        let err = harness
            .processor
            .process(Uuid::new_v4(), upload_id, &ChunkingConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Processing(_)));
        let upload = UploadRepository::find_by_id(harness.store.as_ref(), upload_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upload.status(), UploadStatus::Failed);
        assert!(upload.error_message().is_some());
        assert!(!harness.blobs.contains(Harness::BUCKET, &temp_path));
    }

    async fn stage_pending(harness: &Harness, kb_id: Uuid, name: &str, data: &[u8]) -> Uuid {
        match harness.staging.stage(kb_id, name, None, data).await.unwrap() {
            StageOutcome::Pending { upload_id, .. } => upload_id,
            other => panic!("expected a pending upload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_first_ingest_leaves_no_document() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let data = "q".repeat(150);
        let upload_id = stage_pending(&harness, kb.id(), "doc.txt", data.as_bytes()).await;
        harness.vectors.fail_add.store(true, Ordering::SeqCst);

        let result = harness
            .processor
            .process(Uuid::new_v4(), upload_id, &ChunkingConfig::new(100, 0).unwrap())
            .await;
        assert!(result.is_err());
        assert!(
            harness
                .store
                .find_by_name(kb.id(), "doc.txt")
                .await
                .unwrap()
                .is_none()
        );

        harness.vectors.fail_add.store(false, Ordering::SeqCst);
        let outcome = harness
            .staging
            .stage(kb.id(), "doc.txt", None, data.as_bytes())
            .await
            .unwrap();
        assert!(matches!(outcome, StageOutcome::Pending { .. }));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_version() {
        let harness = Harness::new();
        let kb = harness.knowledge_base().await;
        let v1 = format!("{}{}", "a".repeat(100), "c".repeat(100));
        let (document, _) = harness
            .processed_upload(&kb, "notes.txt", v1.as_bytes())
            .await;

        let v2 = "b".repeat(200);
        let upload_id = stage_pending(&harness, kb.id(), "notes.txt", v2.as_bytes()).await;
        harness.vectors.fail_add.store(true, Ordering::SeqCst);
        let result = harness
            .processor
            .process(Uuid::new_v4(), upload_id, &ChunkingConfig::new(100, 0).unwrap())
            .await;
        assert!(result.is_err());

        let stored = harness
            .store
            .find_by_name(kb.id(), "notes.txt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id(), document.id());
        assert_eq!(stored.file_hash(), &FileHash::from_bytes(v1.as_bytes()));
        assert_eq!(
            harness
                .blobs
                .get(Harness::BUCKET, stored.file_path())
                .await
                .unwrap(),
            v1.as_bytes()
        );
        assert_eq!(harness.vectors.inner().len(&kb.collection_name()).await, 2);

        harness.vectors.fail_add.store(false, Ordering::SeqCst);
        let outcome = harness
            .staging
            .stage(kb.id(), "notes.txt", None, v2.as_bytes())
            .await
            .unwrap();
        assert!(matches!(outcome, StageOutcome::Pending { .. }));
    }
}
