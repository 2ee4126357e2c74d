use std::sync::Arc;

use tracing::info;

use crate::{
    application::{
        ports::{
            BlobStore, DocumentExtractor, EmbeddingProvider, JobHandler, TaskQueue, TextSplitter,
            VectorIndex,
        },
        services::{
            AsyncDispatcher, ChunkSynchronizer, ConsistencyCleanupOrchestrator, DocumentProcessor,
            JobRouter, ProcessingTaskCoordinator, StagingSettings, UploadStagingManager,
        },
        use_cases::{
            CreateKnowledgeBaseUseCase, DeleteKnowledgeBaseUseCase, ExpireStagedUploadsUseCase,
            GetDocumentUseCase, GetKnowledgeBaseUseCase, GetTaskStatusUseCase,
            ListKnowledgeBasesUseCase, ListTasksUseCase, ListUploadsUseCase,
            PreviewDocumentUseCase, ReadDocumentFileUseCase, SearchKnowledgeBaseUseCase,
            SubmitDeletionUseCase, SubmitProcessingUseCase, SubmitUploadUseCase,
            UpdateKnowledgeBaseUseCase, UploadAndProcessUseCase,
        },
    },
    config::AppConfig,
    domain::repositories::{
        ChunkRepository, DocumentRepository, KnowledgeBaseRepository, TaskRepository,
        UploadRepository,
    },
    infrastructure::{
        database::{
            create_connection_pool,
            repositories::{
                PgVectorIndex, PostgresChunkRepository, PostgresDocumentRepository,
                PostgresKnowledgeBaseRepository, PostgresTaskRepository, PostgresUploadRepository,
            },
            run_migrations,
        },
        external_services::{
            CompositeDocumentExtractor, EmbeddingsClientConfig, InferenceClient,
            InferenceEmbeddingProvider, RTSplitter,
        },
        file_system::LocalBlobStore,
        memory::{MemoryStore, MemoryVectorIndex},
        messaging::{MpscTaskQueue, StagingSweeper, WorkerPool},
    },
    presentation::http::handlers::{
        DocumentHandler, DocumentUseCases, KnowledgeBaseHandler, SearchHandler, TaskHandler,
    },
};

struct Persistence {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    upload_repository: Arc<dyn UploadRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    task_repository: Arc<dyn TaskRepository>,
    vector_index: Arc<dyn VectorIndex>,
}

fn postgres_persistence(
    database_url: &str,
    pool_size: u32,
    embedding_provider: Arc<dyn EmbeddingProvider>,
) -> Result<Persistence, Box<dyn std::error::Error>> {
    let db_pool = create_connection_pool(database_url, pool_size)?;
    run_migrations(&db_pool)?;
    info!("Using PostgreSQL persistence with pool size {}", pool_size);

    Ok(Persistence {
        knowledge_base_repository: Arc::new(PostgresKnowledgeBaseRepository::new(db_pool.clone())),
        document_repository: Arc::new(PostgresDocumentRepository::new(db_pool.clone())),
        upload_repository: Arc::new(PostgresUploadRepository::new(db_pool.clone())),
        chunk_repository: Arc::new(PostgresChunkRepository::new(db_pool.clone())),
        task_repository: Arc::new(PostgresTaskRepository::new(db_pool.clone())),
        vector_index: Arc::new(PgVectorIndex::new(db_pool, embedding_provider)),
    })
}

fn memory_persistence(embedding_provider: Arc<dyn EmbeddingProvider>) -> Persistence {
    info!("DATABASE_URL not set, using in-memory persistence");
    let store = Arc::new(MemoryStore::new());

    Persistence {
        knowledge_base_repository: store.clone(),
        document_repository: store.clone(),
        upload_repository: store.clone(),
        chunk_repository: store.clone(),
        task_repository: store,
        vector_index: Arc::new(MemoryVectorIndex::new(embedding_provider)),
    }
}

pub struct AppContainer {
    // Repositories
    pub knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub upload_repository: Arc<dyn UploadRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub task_repository: Arc<dyn TaskRepository>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub blob_store: Arc<dyn BlobStore>,
    pub document_extractor: Arc<dyn DocumentExtractor>,
    pub text_splitter: Arc<dyn TextSplitter>,

    // Task Queue and Background Processing
    pub task_queue: Arc<dyn TaskQueue>,
    pub worker_pool: WorkerPool,
    pub staging_sweeper: StagingSweeper,

    // Application Services
    pub coordinator: Arc<ProcessingTaskCoordinator>,
    pub dispatcher: Arc<AsyncDispatcher>,
    pub staging: Arc<UploadStagingManager>,
    pub synchronizer: Arc<ChunkSynchronizer>,
    pub orchestrator: Arc<ConsistencyCleanupOrchestrator>,
    pub document_processor: Arc<DocumentProcessor>,

    // HTTP Handlers
    pub knowledge_base_handler: Arc<KnowledgeBaseHandler>,
    pub document_handler: Arc<DocumentHandler>,
    pub task_handler: Arc<TaskHandler>,
    pub search_handler: Arc<SearchHandler>,
}

impl AppContainer {
    pub fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Create the embedding provider once, every vector operation shares it
        let inference_client = InferenceClient::new(EmbeddingsClientConfig::new(
            config.embeddings_service_url.clone(),
            config.embedding_dimension,
        ))
        .map_err(|e| format!("Failed to create embeddings client: {}", e))?;
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(InferenceEmbeddingProvider::new(inference_client));

        // Create repositories and the vector index
        let persistence = match config.database_url.as_deref() {
            Some(url) => {
                postgres_persistence(url, config.database_pool_size, embedding_provider.clone())?
            }
            None => memory_persistence(embedding_provider.clone()),
        };
        let Persistence {
            knowledge_base_repository,
            document_repository,
            upload_repository,
            chunk_repository,
            task_repository,
            vector_index,
        } = persistence;

        // Create external services
        let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(config.blob_root.clone()));
        let document_extractor: Arc<dyn DocumentExtractor> =
            Arc::new(CompositeDocumentExtractor::new());
        let text_splitter: Arc<dyn TextSplitter> = Arc::new(RTSplitter::default());

        // Create task queue
        let (task_queue, task_receiver) = MpscTaskQueue::create_pair(config.queue_capacity);
        let task_queue: Arc<dyn TaskQueue> = Arc::new(task_queue);

        // Create application services
        let coordinator = Arc::new(ProcessingTaskCoordinator::new(task_repository.clone()));
        let dispatcher = Arc::new(AsyncDispatcher::new(
            task_queue.clone(),
            coordinator.clone(),
            config.cleanup_retry,
        ));

        let staging = Arc::new(UploadStagingManager::new(
            knowledge_base_repository.clone(),
            document_repository.clone(),
            upload_repository.clone(),
            blob_store.clone(),
            StagingSettings {
                bucket: config.blob_bucket.clone(),
                verify_attempts: config.staging_verify_attempts,
                verify_interval: config.staging_verify_interval,
            },
        ));

        let synchronizer = Arc::new(ChunkSynchronizer::new(
            chunk_repository.clone(),
            vector_index.clone(),
            text_splitter.clone(),
            config.vector_batch_size,
        ));

        let orchestrator = Arc::new(ConsistencyCleanupOrchestrator::new(
            knowledge_base_repository.clone(),
            document_repository.clone(),
            upload_repository.clone(),
            chunk_repository.clone(),
            blob_store.clone(),
            vector_index.clone(),
            coordinator.clone(),
            dispatcher.clone(),
            config.blob_bucket.clone(),
        ));

        let document_processor = Arc::new(DocumentProcessor::new(
            upload_repository.clone(),
            document_repository.clone(),
            blob_store.clone(),
            document_extractor.clone(),
            staging.clone(),
            synchronizer.clone(),
            coordinator.clone(),
            config.blob_bucket.clone(),
        ));

        // Create background workers
        let job_router: Arc<dyn JobHandler> = Arc::new(JobRouter::new(
            document_processor.clone(),
            orchestrator.clone(),
        ));
        let worker_pool = WorkerPool::new(task_receiver, dispatcher.clone(), job_router)
            .with_worker_count(config.worker_count);

        let expire_staged_uploads_use_case = Arc::new(ExpireStagedUploadsUseCase::new(
            staging.clone(),
            config.staging_ttl,
        ));
        let staging_sweeper = StagingSweeper::new(
            expire_staged_uploads_use_case.clone(),
            config.staging_sweep_interval,
        );

        // Create use cases
        let create_knowledge_base_use_case = Arc::new(CreateKnowledgeBaseUseCase::new(
            knowledge_base_repository.clone(),
        ));
        let get_knowledge_base_use_case = Arc::new(GetKnowledgeBaseUseCase::new(
            knowledge_base_repository.clone(),
            document_repository.clone(),
        ));
        let list_knowledge_bases_use_case = Arc::new(ListKnowledgeBasesUseCase::new(
            knowledge_base_repository.clone(),
        ));
        let update_knowledge_base_use_case = Arc::new(UpdateKnowledgeBaseUseCase::new(
            knowledge_base_repository.clone(),
        ));
        let delete_knowledge_base_use_case =
            Arc::new(DeleteKnowledgeBaseUseCase::new(orchestrator.clone()));

        let submit_upload_use_case = Arc::new(SubmitUploadUseCase::new(staging.clone()));
        let submit_processing_use_case = Arc::new(SubmitProcessingUseCase::new(
            knowledge_base_repository.clone(),
            upload_repository.clone(),
            coordinator.clone(),
            dispatcher.clone(),
            config.chunking,
        ));
        let upload_and_process_use_case = Arc::new(UploadAndProcessUseCase::new(
            submit_upload_use_case.clone(),
            submit_processing_use_case.clone(),
        ));
        let submit_deletion_use_case = Arc::new(SubmitDeletionUseCase::new(orchestrator.clone()));
        let preview_document_use_case = Arc::new(PreviewDocumentUseCase::new(
            document_repository.clone(),
            upload_repository.clone(),
            blob_store.clone(),
            document_extractor.clone(),
            synchronizer.clone(),
            config.blob_bucket.clone(),
        ));
        let get_document_use_case = Arc::new(GetDocumentUseCase::new(
            document_repository.clone(),
            coordinator.clone(),
        ));
        let list_uploads_use_case = Arc::new(ListUploadsUseCase::new(
            knowledge_base_repository.clone(),
            upload_repository.clone(),
        ));
        let read_document_file_use_case = Arc::new(ReadDocumentFileUseCase::new(
            document_repository.clone(),
            blob_store.clone(),
            config.blob_bucket.clone(),
        ));

        let get_task_status_use_case = Arc::new(GetTaskStatusUseCase::new(coordinator.clone()));
        let list_tasks_use_case = Arc::new(ListTasksUseCase::new(
            knowledge_base_repository.clone(),
            coordinator.clone(),
        ));

        let search_use_case = Arc::new(SearchKnowledgeBaseUseCase::new(
            knowledge_base_repository.clone(),
            vector_index.clone(),
        ));

        // Create HTTP handlers
        let knowledge_base_handler = Arc::new(KnowledgeBaseHandler::new(
            create_knowledge_base_use_case,
            get_knowledge_base_use_case,
            list_knowledge_bases_use_case,
            update_knowledge_base_use_case,
            delete_knowledge_base_use_case,
        ));
        let document_handler = Arc::new(DocumentHandler::new(
            DocumentUseCases {
                upload: submit_upload_use_case,
                process: submit_processing_use_case,
                upload_and_process: upload_and_process_use_case,
                deletion: submit_deletion_use_case,
                preview: preview_document_use_case,
                get: get_document_use_case,
                list_uploads: list_uploads_use_case,
                read_file: read_document_file_use_case,
                expire: expire_staged_uploads_use_case,
            },
            config.chunking,
        ));
        let task_handler = Arc::new(TaskHandler::new(
            get_task_status_use_case,
            list_tasks_use_case,
        ));
        let search_handler = Arc::new(SearchHandler::new(search_use_case));

        Ok(Self {
            knowledge_base_repository,
            document_repository,
            upload_repository,
            chunk_repository,
            task_repository,
            embedding_provider,
            vector_index,
            blob_store,
            document_extractor,
            text_splitter,
            task_queue,
            worker_pool,
            staging_sweeper,
            coordinator,
            dispatcher,
            staging,
            synchronizer,
            orchestrator,
            document_processor,
            knowledge_base_handler,
            document_handler,
            task_handler,
            search_handler,
        })
    }
}
