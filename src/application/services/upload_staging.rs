use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::content_fingerprinter::ContentFingerprinter;
use crate::application::ports::BlobStore;
use crate::domain::entities::DocumentUpload;
use crate::domain::repositories::{DocumentRepository, KnowledgeBaseRepository, UploadRepository};
use crate::error::{IngestError, IngestResult};

#[derive(Debug, Clone)]
pub struct StagingSettings {
    pub bucket: String,
    pub verify_attempts: u32,
    pub verify_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Same name and content are already ingested; nothing was written.
    Exists { document_id: Uuid },
    Pending { upload_id: Uuid, temp_path: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpireReport {
    pub removed: usize,
    pub blob_failures: usize,
}

pub struct UploadStagingManager {
    knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    upload_repository: Arc<dyn UploadRepository>,
    blob_store: Arc<dyn BlobStore>,
    settings: StagingSettings,
}

impl UploadStagingManager {
    pub fn new(
        knowledge_base_repository: Arc<dyn KnowledgeBaseRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        upload_repository: Arc<dyn UploadRepository>,
        blob_store: Arc<dyn BlobStore>,
        settings: StagingSettings,
    ) -> Self {
        Self {
            knowledge_base_repository,
            document_repository,
            upload_repository,
            blob_store,
            settings,
        }
    }

    pub async fn stage<R>(
        &self,
        kb_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        mut reader: R,
    ) -> IngestResult<StageOutcome>
    where
        R: AsyncRead + Unpin + Send,
    {
        let file_name = sanitize_file_name(file_name)?;

        self.knowledge_base_repository
            .find_by_id(kb_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Knowledge base {}", kb_id)))?;

        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| IngestError::Staging(format!("Failed to read upload stream: {}", e)))?;

        let file_hash = ContentFingerprinter::hash(&data);

        if let Some(document) = self
            .document_repository
            .find_by_name_and_hash(kb_id, &file_name, &file_hash)
            .await?
        {
            debug!(
                "Upload {} matches existing document {}",
                file_name,
                document.id()
            );
            return Ok(StageOutcome::Exists {
                document_id: document.id(),
            });
        }

        let upload_id = Uuid::new_v4();
        let temp_path = temp_path_for(kb_id, upload_id, &file_name);
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(&file_name).to_string());

        self.blob_store
            .put(&self.settings.bucket, &temp_path, &data, Some(&content_type))
            .await
            .map_err(|e| IngestError::Staging(format!("Failed to stage {}: {}", file_name, e)))?;

        let upload = DocumentUpload::new(
            upload_id,
            kb_id,
            file_name.clone(),
            file_hash,
            data.len() as i64,
            content_type,
            temp_path.clone(),
        );

        if let Err(e) = self.upload_repository.save(&upload).await {
            if let Err(remove_err) = self
                .blob_store
                .remove(&self.settings.bucket, &temp_path)
                .await
            {
                warn!(
                    "Failed to remove staged blob {} after insert failure: {}",
                    temp_path, remove_err
                );
            }
            return Err(e.into());
        }

        info!(
            "Staged {} ({} bytes) as upload {}",
            file_name,
            data.len(),
            upload_id
        );

        Ok(StageOutcome::Pending {
            upload_id,
            temp_path,
        })
    }

    /// Polls the blob store until the staged object is visible with the
    /// expected size. Never fails; a miss is only logged.
    pub async fn verify(&self, temp_path: &str, expected_size: i64) -> bool {
        let attempts = self.settings.verify_attempts.max(1);
        for attempt in 1..=attempts {
            match self.blob_store.stat(&self.settings.bucket, temp_path).await {
                Ok(info) if info.size as i64 == expected_size => return true,
                Ok(info) => debug!(
                    "Staged object {} has {} bytes, expected {} (attempt {}/{})",
                    temp_path, info.size, expected_size, attempt, attempts
                ),
                Err(e) => debug!(
                    "Staged object {} not readable yet (attempt {}/{}): {}",
                    temp_path, attempt, attempts, e
                ),
            }

            if attempt < attempts {
                tokio::time::sleep(self.settings.verify_interval).await;
            }
        }

        warn!(
            "Staged object {} could not be verified after {} attempts",
            temp_path, attempts
        );
        false
    }

    /// Deletes every staged upload created before `older_than`.
    pub async fn expire(&self, older_than: DateTime<Utc>) -> IngestResult<ExpireReport> {
        let expired = self
            .upload_repository
            .find_created_before(older_than)
            .await?;

        let mut report = ExpireReport::default();
        for upload in expired {
            match self
                .blob_store
                .remove(&self.settings.bucket, upload.temp_path())
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", upload.temp_path(), e);
                    report.blob_failures += 1;
                }
            }

            if self.upload_repository.delete(upload.id()).await? {
                report.removed += 1;
            }
        }

        if report.removed > 0 {
            info!(
                "Cleaned {} expired uploads ({} blob failures)",
                report.removed, report.blob_failures
            );
        }
        Ok(report)
    }
}

pub fn temp_path_for(kb_id: Uuid, upload_id: Uuid, file_name: &str) -> String {
    format!("kb_{}/temp/{}/{}", kb_id, upload_id, file_name)
}

/// Reduces a client supplied name to a single safe path segment.
pub fn sanitize_file_name(file_name: &str) -> IngestResult<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let base = base.trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(IngestError::Validation(format!(
            "Invalid file name: {:?}",
            file_name
        )));
    }
    Ok(base.to_string())
}

pub fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
