use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::{
    Document, DocumentChunk, DocumentUpload, KnowledgeBase, ProcessingTask,
};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, KnowledgeBaseRepository, RecordedChunk, RepositoryError,
    TaskRepository, UploadRepository,
};
use crate::domain::value_objects::{FileHash, TaskStatus, UploadStatus};

#[derive(Default)]
struct Tables {
    knowledge_bases: HashMap<Uuid, KnowledgeBase>,
    documents: HashMap<Uuid, Document>,
    uploads: HashMap<Uuid, DocumentUpload>,
    chunks: HashMap<String, DocumentChunk>,
    tasks: HashMap<Uuid, ProcessingTask>,
}

/// Relational store kept in process memory.
///
/// A single lock guards every table, so multi-table operations are atomic
/// the same way a database transaction is.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeBaseRepository for MemoryStore {
    async fn save(&self, knowledge_base: &KnowledgeBase) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables
            .knowledge_bases
            .insert(knowledge_base.id(), knowledge_base.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<KnowledgeBase>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.knowledge_bases.get(&id).cloned())
    }

    async fn update(&self, knowledge_base: &KnowledgeBase) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.knowledge_bases.get_mut(&knowledge_base.id()) {
            Some(stored) => {
                *stored = knowledge_base.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<KnowledgeBase>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut all: Vec<KnowledgeBase> = tables.knowledge_bases.values().cloned().collect();
        all.sort_by_key(|kb| kb.created_at());
        Ok(all
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.knowledge_bases.remove(&id).is_none() {
            return Ok(false);
        }

        let document_ids: Vec<Uuid> = tables
            .documents
            .values()
            .filter(|doc| doc.knowledge_base_id() == id)
            .map(|doc| doc.id())
            .collect();
        let upload_ids: Vec<Uuid> = tables
            .uploads
            .values()
            .filter(|upload| upload.knowledge_base_id() == id)
            .map(|upload| upload.id())
            .collect();

        tables.documents.retain(|_, doc| doc.knowledge_base_id() != id);
        tables
            .uploads
            .retain(|_, upload| upload.knowledge_base_id() != id);
        tables
            .chunks
            .retain(|_, chunk| chunk.knowledge_base_id() != id);

        for task in tables.tasks.values_mut() {
            let kb = task.knowledge_base_id() == Some(id);
            let doc = task
                .document_id()
                .is_some_and(|doc_id| document_ids.contains(&doc_id));
            let upload = task
                .document_upload_id()
                .is_some_and(|upload_id| upload_ids.contains(&upload_id));
            task.detach(kb, doc, upload);
        }

        Ok(true)
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn find_by_id(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .documents
            .get(&document_id)
            .filter(|doc| doc.knowledge_base_id() == knowledge_base_id)
            .cloned())
    }

    async fn find_by_name_and_hash(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
        file_hash: &FileHash,
    ) -> Result<Option<Document>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .documents
            .values()
            .find(|doc| {
                doc.knowledge_base_id() == knowledge_base_id
                    && doc.file_name() == file_name
                    && doc.file_hash() == file_hash
            })
            .cloned())
    }

    async fn find_by_name(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .documents
            .values()
            .find(|doc| doc.knowledge_base_id() == knowledge_base_id && doc.file_name() == file_name)
            .cloned())
    }

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<Document>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut docs: Vec<Document> = tables
            .documents
            .values()
            .filter(|doc| doc.knowledge_base_id() == knowledge_base_id)
            .cloned()
            .collect();
        docs.sort_by_key(|doc| doc.created_at());
        Ok(docs)
    }

    async fn upsert(&self, document: &Document) -> Result<Document, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables
            .knowledge_bases
            .contains_key(&document.knowledge_base_id())
        {
            return Err(RepositoryError::Conflict(format!(
                "knowledge base {} does not exist",
                document.knowledge_base_id()
            )));
        }

        let existing = tables
            .documents
            .values_mut()
            .find(|doc| {
                doc.knowledge_base_id() == document.knowledge_base_id()
                    && doc.file_name() == document.file_name()
            });

        if let Some(stored) = existing {
            stored.replace_content(
                document.file_path().to_string(),
                document.file_size(),
                document.content_type().to_string(),
                document.file_hash().clone(),
            );
            return Ok(stored.clone());
        }

        tables.documents.insert(document.id(), document.clone());
        Ok(document.clone())
    }

    async fn delete_cascade(
        &self,
        document_id: Uuid,
        upload_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables
            .chunks
            .retain(|_, chunk| chunk.document_id() != document_id);
        tables.documents.remove(&document_id);
        if let Some(upload_id) = upload_id {
            tables.uploads.remove(&upload_id);
        }

        for task in tables.tasks.values_mut() {
            let doc = task.document_id() == Some(document_id);
            let upload = upload_id.is_some() && task.document_upload_id() == upload_id;
            task.detach(false, doc, upload);
        }
        Ok(())
    }
}

#[async_trait]
impl UploadRepository for MemoryStore {
    async fn save(&self, upload: &DocumentUpload) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables
            .knowledge_bases
            .contains_key(&upload.knowledge_base_id())
        {
            return Err(RepositoryError::Conflict(format!(
                "knowledge base {} does not exist",
                upload.knowledge_base_id()
            )));
        }
        tables.uploads.insert(upload.id(), upload.clone());
        Ok(())
    }

    async fn find_by_id(&self, upload_id: Uuid) -> Result<Option<DocumentUpload>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.uploads.get(&upload_id).cloned())
    }

    async fn find_by_hash(
        &self,
        knowledge_base_id: Uuid,
        file_hash: &FileHash,
    ) -> Result<Option<DocumentUpload>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .uploads
            .values()
            .filter(|upload| {
                upload.knowledge_base_id() == knowledge_base_id && upload.file_hash() == file_hash
            })
            .max_by_key(|upload| upload.created_at())
            .cloned())
    }

    async fn update_status(
        &self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(set_upload_status(&mut tables, upload_id, status, error_message))
    }

    async fn transition_status(
        &self,
        upload_id: Uuid,
        expected: UploadStatus,
        next: UploadStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let message = match tables.uploads.get(&upload_id) {
            Some(upload) if upload.status() == expected => {
                upload.error_message().map(str::to_string)
            }
            _ => return Ok(false),
        };
        Ok(set_upload_status(&mut tables, upload_id, next, message))
    }

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<DocumentUpload>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut uploads: Vec<DocumentUpload> = tables
            .uploads
            .values()
            .filter(|upload| upload.knowledge_base_id() == knowledge_base_id)
            .cloned()
            .collect();
        uploads.sort_by_key(|upload| std::cmp::Reverse(upload.created_at()));
        Ok(uploads)
    }

    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DocumentUpload>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .uploads
            .values()
            .filter(|upload| upload.created_at() < cutoff)
            .cloned()
            .collect())
    }

    async fn delete(&self, upload_id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.uploads.remove(&upload_id).is_some();
        if removed {
            for task in tables.tasks.values_mut() {
                let upload = task.document_upload_id() == Some(upload_id);
                task.detach(false, false, upload);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl ChunkRepository for MemoryStore {
    async fn find_recorded(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Vec<RecordedChunk>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .chunks
            .values()
            .filter(|chunk| {
                chunk.knowledge_base_id() == knowledge_base_id && chunk.file_name() == file_name
            })
            .map(|chunk| RecordedChunk {
                id: chunk.id().to_string(),
                hash: chunk.hash().to_string(),
            })
            .collect())
    }

    async fn insert_batch(&self, chunks: &[DocumentChunk]) -> Result<usize, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let mut inserted = 0;
        for chunk in chunks {
            if !tables.documents.contains_key(&chunk.document_id()) {
                return Err(RepositoryError::Conflict(format!(
                    "document {} does not exist",
                    chunk.document_id()
                )));
            }
        }
        for chunk in chunks {
            if !tables.chunks.contains_key(chunk.id()) {
                tables.chunks.insert(chunk.id().to_string(), chunk.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter(|id| tables.chunks.remove(id.as_str()).is_some())
            .count())
    }

    async fn count_by_document(&self, document_id: Uuid) -> Result<i64, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .chunks
            .values()
            .filter(|chunk| chunk.document_id() == document_id)
            .count() as i64)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn save(&self, task: &ProcessingTask) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<ProcessingTask>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.tasks.get(&task_id).cloned())
    }

    async fn compare_and_set(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.tasks.get(&task.id()) else {
            return Ok(false);
        };
        if stored.status() != expected {
            return Ok(false);
        }

        let updated = ProcessingTask::from_database(
            stored.id(),
            stored.knowledge_base_id(),
            stored.document_id(),
            stored.document_upload_id(),
            stored.job_type(),
            task.status(),
            stored.external_task_id().map(str::to_string),
            task.error_message().map(str::to_string),
            task.attempts(),
            stored.created_at(),
            task.updated_at(),
        );
        tables.tasks.insert(task.id(), updated);
        Ok(true)
    }

    async fn set_external_task_id(
        &self,
        task_id: Uuid,
        external_task_id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.tasks.get_mut(&task_id) {
            Some(task) => {
                task.attach_external_handle(external_task_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_document_id(
        &self,
        task_id: Uuid,
        document_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.tasks.get_mut(&task_id) {
            Some(task) => {
                task.link_document(document_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
        task_ids: Option<&[Uuid]>,
    ) -> Result<Vec<ProcessingTask>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut tasks: Vec<ProcessingTask> = tables
            .tasks
            .values()
            .filter(|task| task.knowledge_base_id() == Some(knowledge_base_id))
            .filter(|task| task_ids.is_none_or(|ids| ids.contains(&task.id())))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.created_at());
        Ok(tasks)
    }
}

fn set_upload_status(
    tables: &mut Tables,
    upload_id: Uuid,
    status: UploadStatus,
    error_message: Option<String>,
) -> bool {
    let Some(upload) = tables.uploads.get(&upload_id) else {
        return false;
    };

    let updated = DocumentUpload::from_database(
        upload.id(),
        upload.knowledge_base_id(),
        upload.file_name().to_string(),
        upload.file_hash().clone(),
        upload.file_size(),
        upload.content_type().to_string(),
        upload.temp_path().to_string(),
        status,
        error_message,
        upload.created_at(),
        Utc::now(),
    );
    tables.uploads.insert(upload_id, updated);
    true
}
