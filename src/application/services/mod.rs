pub mod chunk_synchronizer;
pub mod cleanup_orchestrator;
pub mod content_fingerprinter;
pub mod dispatcher;
pub mod document_processor;
pub mod job_router;
pub mod task_coordinator;
pub mod upload_staging;

#[cfg(test)]
pub mod test_support;

pub use chunk_synchronizer::{ChunkDiff, ChunkSynchronizer, SyncReport, SyncTarget};
pub use cleanup_orchestrator::{ConsistencyCleanupOrchestrator, DeletionReceipt};
pub use content_fingerprinter::ContentFingerprinter;
pub use dispatcher::{AsyncDispatcher, ExecutionOutcome, ExecutionReport};
pub use document_processor::DocumentProcessor;
pub use job_router::JobRouter;
pub use task_coordinator::{ProcessingTaskCoordinator, TransitionOutcome};
pub use upload_staging::{ExpireReport, StageOutcome, StagingSettings, UploadStagingManager};
