//! In-process doubles shared by the service tests.

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Map;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use super::chunk_synchronizer::{ChunkSynchronizer, SyncTarget};
use super::cleanup_orchestrator::ConsistencyCleanupOrchestrator;
use super::dispatcher::AsyncDispatcher;
use super::document_processor::DocumentProcessor;
use super::job_router::JobRouter;
use super::task_coordinator::ProcessingTaskCoordinator;
use super::upload_staging::{StageOutcome, StagingSettings, UploadStagingManager};
use crate::application::ports::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, BlobInfo, BlobStore, BlobStoreError,
    DocumentExtractionError, DocumentExtractor, EmbeddingProvider, EmbeddingProviderError,
    ExtractedContent, JobHandler, JobMessage, QueueError, QueueHandle, ScoredEntry, TaskQueue,
    TextChunk, TextSplitter, VectorEntry, VectorIndex, VectorIndexError,
};
use crate::domain::entities::{Document, DocumentChunk, KnowledgeBase};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, KnowledgeBaseRepository, RecordedChunk, RepositoryError,
};
use crate::domain::value_objects::{ChunkingConfig, FileHash, JobKind, RetryPolicy};
use crate::error::IngestError;
use crate::infrastructure::memory::{MemoryStore, MemoryVectorIndex};

/// Byte histogram embedding: equal texts get equal vectors.
pub struct StubEmbeddingProvider {
    dimension: usize,
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self { dimension: 16 }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let embeddings = request
            .texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; self.dimension];
                for byte in text.bytes() {
                    v[byte as usize % self.dimension] += 1.0;
                }
                Vector::from(v)
            })
            .collect();
        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name: "stub".to_string(),
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

/// Cuts text into consecutive `chunk_size` windows and ignores the overlap.
pub struct FixedWindowSplitter;

impl TextSplitter for FixedWindowSplitter {
    fn split(&self, text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(config.chunk_size)
            .map(|window| TextChunk {
                content: window.iter().collect(),
                metadata: Map::new(),
            })
            .collect()
    }
}

pub struct Utf8Extractor;

#[async_trait]
impl DocumentExtractor for Utf8Extractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        _content_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        Ok(ExtractedContent {
            text: String::from_utf8_lossy(data).into_owned(),
            ..Default::default()
        })
    }

    fn can_extract(&self, _content_type: &str) -> bool {
        true
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub fail_put: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl MemoryBlobStore {
    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> Result<(), BlobStoreError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Io("simulated put failure".to_string()));
        }
        self.insert(bucket, key, data);
        Ok(())
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<BlobInfo, BlobStoreError> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|data| BlobInfo {
                key: key.to_string(),
                size: data.len() as u64,
            })
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn copy(&self, bucket: &str, from: &str, to: &str) -> Result<(), BlobStoreError> {
        let data = self.get(bucket, from).await?;
        self.insert(bucket, to, &data);
        Ok(())
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), BlobStoreError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Io("simulated remove failure".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, BlobStoreError> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), data)| BlobInfo {
                key: k.clone(),
                size: data.len() as u64,
            })
            .collect())
    }
}

pub struct FaultyVectorIndex {
    inner: MemoryVectorIndex,
    pub fail_add: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FaultyVectorIndex {
    pub fn new() -> Self {
        Self {
            inner: MemoryVectorIndex::new(Arc::new(StubEmbeddingProvider::default())),
            fail_add: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &MemoryVectorIndex {
        &self.inner
    }

    fn check_delete(&self) -> Result<(), VectorIndexError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(VectorIndexError::Backend(
                "simulated vector delete failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FaultyVectorIndex {
    async fn add(&self, collection: &str, entries: &[VectorEntry]) -> Result<(), VectorIndexError> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(VectorIndexError::Backend(
                "simulated vector add failure".to_string(),
            ));
        }
        self.inner.add(collection, entries).await
    }

    async fn delete_ids(&self, collection: &str, ids: &[String]) -> Result<usize, VectorIndexError> {
        self.check_delete()?;
        self.inner.delete_ids(collection, ids).await
    }

    async fn delete_by_document(
        &self,
        collection: &str,
        document_id: Uuid,
    ) -> Result<usize, VectorIndexError> {
        self.check_delete()?;
        self.inner.delete_by_document(collection, document_id).await
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorIndexError> {
        self.check_delete()?;
        self.inner.delete_collection(collection).await
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredEntry>, VectorIndexError> {
        self.inner.similarity_search(collection, query, top_k).await
    }
}

pub struct FaultyChunkRepository {
    inner: Arc<MemoryStore>,
    pub fail_insert: AtomicBool,
}

#[async_trait]
impl ChunkRepository for FaultyChunkRepository {
    async fn find_recorded(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Vec<RecordedChunk>, RepositoryError> {
        self.inner.find_recorded(knowledge_base_id, file_name).await
    }

    async fn insert_batch(&self, chunks: &[DocumentChunk]) -> Result<usize, RepositoryError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "simulated insert failure".to_string(),
            ));
        }
        self.inner.insert_batch(chunks).await
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, RepositoryError> {
        self.inner.delete_by_ids(ids).await
    }

    async fn count_by_document(&self, document_id: Uuid) -> Result<i64, RepositoryError> {
        self.inner.count_by_document(document_id).await
    }
}

pub struct FaultyDocumentRepository {
    inner: Arc<MemoryStore>,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl DocumentRepository for FaultyDocumentRepository {
    async fn find_by_id(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, RepositoryError> {
        DocumentRepository::find_by_id(self.inner.as_ref(), knowledge_base_id, document_id).await
    }

    async fn find_by_name_and_hash(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
        file_hash: &FileHash,
    ) -> Result<Option<Document>, RepositoryError> {
        self.inner
            .find_by_name_and_hash(knowledge_base_id, file_name, file_hash)
            .await
    }

    async fn find_by_name(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        self.inner.find_by_name(knowledge_base_id, file_name).await
    }

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<Document>, RepositoryError> {
        self.inner.list_by_knowledge_base(knowledge_base_id).await
    }

    async fn upsert(&self, document: &Document) -> Result<Document, RepositoryError> {
        self.inner.upsert(document).await
    }

    async fn delete_cascade(
        &self,
        document_id: Uuid,
        upload_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "simulated transaction failure".to_string(),
            ));
        }
        self.inner.delete_cascade(document_id, upload_id).await
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    messages: Mutex<Vec<JobMessage>>,
    next_id: AtomicU64,
    pub fail: AtomicBool,
}

impl RecordingQueue {
    pub fn messages(&self) -> Vec<JobMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn enqueue(&self, message: JobMessage) -> Result<QueueHandle, QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        self.messages.lock().unwrap().push(message);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(QueueHandle(format!("job-{}", id)))
    }
}

/// Fails a fixed number of times, then succeeds.
pub struct ScriptedHandler {
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl ScriptedHandler {
    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandler for ScriptedHandler {
    async fn handle(&self, _message: &JobMessage) -> Result<(), IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(IngestError::Cleanup("simulated failure".to_string()));
        }
        Ok(())
    }
}

/// Every service wired against in-memory adapters.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub vectors: Arc<FaultyVectorIndex>,
    pub chunks: Arc<FaultyChunkRepository>,
    pub documents: Arc<FaultyDocumentRepository>,
    pub queue: Arc<RecordingQueue>,
    pub coordinator: Arc<ProcessingTaskCoordinator>,
    pub dispatcher: Arc<AsyncDispatcher>,
    pub staging: Arc<UploadStagingManager>,
    pub synchronizer: Arc<ChunkSynchronizer>,
    pub orchestrator: Arc<ConsistencyCleanupOrchestrator>,
    pub processor: Arc<DocumentProcessor>,
    pub router: Arc<JobRouter>,
}

impl Harness {
    pub const BUCKET: &'static str = "documents";

    pub fn retry_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
    }

    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::default());
        let vectors = Arc::new(FaultyVectorIndex::new());
        let chunks = Arc::new(FaultyChunkRepository {
            inner: store.clone(),
            fail_insert: AtomicBool::new(false),
        });
        let documents = Arc::new(FaultyDocumentRepository {
            inner: store.clone(),
            fail_delete: AtomicBool::new(false),
        });
        let queue = Arc::new(RecordingQueue::default());

        let blob_store: Arc<dyn BlobStore> = blobs.clone();
        let vector_index: Arc<dyn VectorIndex> = vectors.clone();

        let coordinator = Arc::new(ProcessingTaskCoordinator::new(store.clone()));
        let dispatcher = Arc::new(AsyncDispatcher::new(
            queue.clone(),
            coordinator.clone(),
            Self::retry_policy(),
        ));
        let staging = Arc::new(UploadStagingManager::new(
            store.clone(),
            documents.clone(),
            store.clone(),
            blob_store.clone(),
            StagingSettings {
                bucket: Self::BUCKET.to_string(),
                verify_attempts: 3,
                verify_interval: Duration::from_millis(1),
            },
        ));
        let synchronizer = Arc::new(ChunkSynchronizer::new(
            chunks.clone(),
            vector_index.clone(),
            Arc::new(FixedWindowSplitter),
            2,
        ));
        let orchestrator = Arc::new(ConsistencyCleanupOrchestrator::new(
            store.clone(),
            documents.clone(),
            store.clone(),
            chunks.clone(),
            blob_store.clone(),
            vector_index,
            coordinator.clone(),
            dispatcher.clone(),
            Self::BUCKET.to_string(),
        ));
        let processor = Arc::new(DocumentProcessor::new(
            store.clone(),
            documents.clone(),
            blob_store,
            Arc::new(Utf8Extractor),
            staging.clone(),
            synchronizer.clone(),
            coordinator.clone(),
            Self::BUCKET.to_string(),
        ));
        let router = Arc::new(JobRouter::new(processor.clone(), orchestrator.clone()));

        Self {
            store,
            blobs,
            vectors,
            chunks,
            documents,
            queue,
            coordinator,
            dispatcher,
            staging,
            synchronizer,
            orchestrator,
            processor,
            router,
        }
    }

    pub async fn knowledge_base(&self) -> KnowledgeBase {
        let kb = KnowledgeBase::new("test kb".to_string(), None).unwrap();
        KnowledgeBaseRepository::save(self.store.as_ref(), &kb)
            .await
            .unwrap();
        kb
    }

    /// A document row and its blob, with no chunks indexed.
    pub async fn ingested_document(&self, kb: &KnowledgeBase, name: &str, data: &[u8]) -> Document {
        let path = format!("kb_{}/{}", kb.id(), name);
        self.blobs.insert(Self::BUCKET, &path, data);
        let document = Document::new(
            kb.id(),
            name.to_string(),
            path,
            data.len() as i64,
            "text/plain".to_string(),
            FileHash::from_bytes(data),
        );
        self.store.upsert(&document).await.unwrap()
    }

    /// A document whose text is indexed in chunks.
    pub async fn processed_document(&self, kb: &KnowledgeBase, name: &str, text: &str) -> Document {
        let document = self.ingested_document(kb, name, text.as_bytes()).await;
        let target = SyncTarget {
            kb_id: kb.id(),
            document_id: document.id(),
            file_name: name.to_string(),
        };
        self.synchronizer
            .synchronize(&target, text, &ChunkingConfig::new(100, 0).unwrap())
            .await
            .unwrap();
        document
    }

    /// Runs an upload through staging and processing.
    pub async fn processed_upload(
        &self,
        kb: &KnowledgeBase,
        name: &str,
        data: &[u8],
    ) -> (Document, Uuid) {
        let StageOutcome::Pending { upload_id, .. } = self
            .staging
            .stage(kb.id(), name, None, data)
            .await
            .unwrap()
        else {
            panic!("expected a pending upload");
        };
        let task = self
            .coordinator
            .create(kb.id(), JobKind::ProcessDoc, None, Some(upload_id))
            .await
            .unwrap();
        let processed = self
            .processor
            .process(task.id(), upload_id, &ChunkingConfig::new(100, 0).unwrap())
            .await
            .unwrap();
        (processed.document, upload_id)
    }
}
