use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::content_fingerprinter::ContentFingerprinter;
use crate::application::ports::{TextSplitter, VectorEntry, VectorIndex};
use crate::domain::entities::{DocumentChunk, knowledge_base::collection_name};
use crate::domain::repositories::{ChunkRepository, RecordedChunk};
use crate::domain::value_objects::{ChunkFingerprint, ChunkingConfig};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub kb_id: Uuid,
    pub document_id: Uuid,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// A freshly split chunk together with its fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateChunk {
    pub fingerprint: ChunkFingerprint,
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// Minimal set of writes that brings the ledger in line with the candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkDiff {
    pub additions: Vec<CandidateChunk>,
    pub deletions: Vec<String>,
    pub unchanged: usize,
}

impl ChunkDiff {
    pub fn compute(recorded: &[RecordedChunk], candidates: Vec<CandidateChunk>) -> Self {
        let recorded_hashes: HashSet<&str> = recorded.iter().map(|r| r.hash.as_str()).collect();

        let mut seen = HashSet::new();
        let mut diff = ChunkDiff::default();
        for candidate in candidates {
            if !seen.insert(candidate.fingerprint.content_hash.clone()) {
                continue;
            }
            if recorded_hashes.contains(candidate.fingerprint.content_hash.as_str()) {
                diff.unchanged += 1;
            } else {
                diff.additions.push(candidate);
            }
        }

        diff.deletions = recorded
            .iter()
            .filter(|r| !seen.contains(&r.hash))
            .map(|r| r.id.clone())
            .collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

pub struct ChunkSynchronizer {
    chunk_repository: Arc<dyn ChunkRepository>,
    vector_index: Arc<dyn VectorIndex>,
    text_splitter: Arc<dyn TextSplitter>,
    batch_size: usize,
}

impl ChunkSynchronizer {
    pub fn new(
        chunk_repository: Arc<dyn ChunkRepository>,
        vector_index: Arc<dyn VectorIndex>,
        text_splitter: Arc<dyn TextSplitter>,
        batch_size: usize,
    ) -> Self {
        Self {
            chunk_repository,
            vector_index,
            text_splitter,
            batch_size: batch_size.max(1),
        }
    }

    /// Splits and fingerprints `text` the same way a sync would, without writing.
    pub fn candidates(
        &self,
        target: &SyncTarget,
        text: &str,
        config: &ChunkingConfig,
    ) -> IngestResult<Vec<CandidateChunk>> {
        config.validate().map_err(IngestError::Validation)?;

        Ok(self
            .text_splitter
            .split(text, config)
            .into_iter()
            .map(|chunk| {
                let mut metadata = chunk.metadata;
                metadata.insert("source".to_string(), Value::String(target.file_name.clone()));
                let fingerprint = ContentFingerprinter::chunk_fingerprint(
                    target.kb_id,
                    &target.file_name,
                    &chunk.content,
                    &metadata,
                );
                CandidateChunk {
                    fingerprint,
                    content: chunk.content,
                    metadata,
                }
            })
            .collect())
    }

    pub async fn synchronize(
        &self,
        target: &SyncTarget,
        text: &str,
        config: &ChunkingConfig,
    ) -> IngestResult<SyncReport> {
        let candidates = self.candidates(target, text, config)?;
        let recorded = self
            .chunk_repository
            .find_recorded(target.kb_id, &target.file_name)
            .await?;

        let diff = ChunkDiff::compute(&recorded, candidates);
        let report = SyncReport {
            added: diff.additions.len(),
            deleted: diff.deletions.len(),
            unchanged: diff.unchanged,
        };

        if diff.is_empty() {
            debug!(
                "{} in kb {} is already in sync ({} chunks)",
                target.file_name, target.kb_id, diff.unchanged
            );
            return Ok(report);
        }

        let collection = collection_name(target.kb_id);

        // Additions land before deletions so readers never see neither version.
        for batch in diff.additions.chunks(self.batch_size) {
            self.add_batch(&collection, target, batch).await?;
        }

        if !diff.deletions.is_empty() {
            self.vector_index
                .delete_ids(&collection, &diff.deletions)
                .await
                .map_err(|e| {
                    IngestError::Processing(format!("Failed to delete stale vectors: {}", e))
                })?;
            self.chunk_repository.delete_by_ids(&diff.deletions).await?;
        }

        info!(
            "Synchronized {} in kb {}: {} added, {} deleted, {} unchanged",
            target.file_name, target.kb_id, report.added, report.deleted, report.unchanged
        );
        Ok(report)
    }

    /// Drops every vector stored for the target's document. Ledger rows go
    /// with the document row.
    pub async fn discard(&self, target: &SyncTarget) -> IngestResult<usize> {
        self.vector_index
            .delete_by_document(&collection_name(target.kb_id), target.document_id)
            .await
            .map_err(|e| IngestError::Processing(format!("Failed to drop vectors: {}", e)))
    }

    async fn add_batch(
        &self,
        collection: &str,
        target: &SyncTarget,
        batch: &[CandidateChunk],
    ) -> IngestResult<()> {
        let entries: Vec<VectorEntry> = batch
            .iter()
            .map(|candidate| VectorEntry {
                id: candidate.fingerprint.chunk_id.clone(),
                document_id: target.document_id,
                content: candidate.content.clone(),
                metadata: candidate.metadata.clone(),
            })
            .collect();

        self.vector_index
            .add(collection, &entries)
            .await
            .map_err(|e| IngestError::Processing(format!("Failed to index chunks: {}", e)))?;

        let rows: Vec<DocumentChunk> = batch
            .iter()
            .map(|candidate| {
                DocumentChunk::new(
                    &candidate.fingerprint,
                    target.kb_id,
                    target.document_id,
                    target.file_name.clone(),
                    candidate.metadata.clone(),
                )
            })
            .collect();

        if let Err(e) = self.chunk_repository.insert_batch(&rows).await {
            let ids: Vec<String> = entries.into_iter().map(|entry| entry.id).collect();
            if let Err(rollback_err) = self.vector_index.delete_ids(collection, &ids).await {
                warn!(
                    "Failed to roll back {} vectors after ledger insert failure: {}",
                    ids.len(),
                    rollback_err
                );
            }
            return Err(IngestError::Processing(format!(
                "Failed to record chunks: {}",
                e
            )));
        }

        Ok(())
    }
}
