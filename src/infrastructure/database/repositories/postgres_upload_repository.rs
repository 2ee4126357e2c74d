use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentUpload;
use crate::domain::repositories::{RepositoryError, UploadRepository};
use crate::domain::value_objects::{FileHash, UploadStatus};
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::UploadModel;
use crate::infrastructure::database::schema::document_uploads;

pub struct PostgresUploadRepository {
    pool: DbPool,
}

impl PostgresUploadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(model: UploadModel) -> Result<DocumentUpload, RepositoryError> {
    DocumentUpload::try_from(model).map_err(RepositoryError::Conversion)
}

#[async_trait]
impl UploadRepository for PostgresUploadRepository {
    async fn save(&self, upload: &DocumentUpload) -> Result<(), RepositoryError> {
        let model = UploadModel::from(upload);

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(document_uploads::table)
                .values(&model)
                .execute(conn)
                .map_err(db_error("Failed to save upload"))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, upload_id: Uuid) -> Result<Option<DocumentUpload>, RepositoryError> {
        let model = with_connection(&self.pool, move |conn| {
            document_uploads::table
                .find(upload_id)
                .select(UploadModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find upload"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    async fn find_by_hash(
        &self,
        knowledge_base_id: Uuid,
        file_hash: &FileHash,
    ) -> Result<Option<DocumentUpload>, RepositoryError> {
        let file_hash = file_hash.as_str().to_string();

        let model = with_connection(&self.pool, move |conn| {
            document_uploads::table
                .filter(document_uploads::knowledge_base_id.eq(knowledge_base_id))
                .filter(document_uploads::file_hash.eq(file_hash))
                .order(document_uploads::created_at.desc())
                .select(UploadModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find upload by hash"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    async fn update_status(
        &self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(document_uploads::table.find(upload_id))
                .set((
                    document_uploads::status.eq(status.as_str()),
                    document_uploads::error_message.eq(error_message),
                    document_uploads::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(db_error("Failed to update upload status"))?;
            Ok(updated > 0)
        })
        .await
    }

    async fn transition_status(
        &self,
        upload_id: Uuid,
        expected: UploadStatus,
        next: UploadStatus,
    ) -> Result<bool, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(
                document_uploads::table
                    .filter(document_uploads::id.eq(upload_id))
                    .filter(document_uploads::status.eq(expected.as_str())),
            )
            .set((
                document_uploads::status.eq(next.as_str()),
                document_uploads::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .map_err(db_error("Failed to transition upload status"))?;
            Ok(updated == 1)
        })
        .await
    }

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<DocumentUpload>, RepositoryError> {
        let models = with_connection(&self.pool, move |conn| {
            document_uploads::table
                .filter(document_uploads::knowledge_base_id.eq(knowledge_base_id))
                .order(document_uploads::created_at.desc())
                .select(UploadModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to list uploads"))
        })
        .await?;

        models.into_iter().map(to_domain).collect()
    }

    async fn find_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DocumentUpload>, RepositoryError> {
        let models = with_connection(&self.pool, move |conn| {
            document_uploads::table
                .filter(document_uploads::created_at.lt(cutoff))
                .order(document_uploads::created_at.asc())
                .select(UploadModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to find stale uploads"))
        })
        .await?;

        models.into_iter().map(to_domain).collect()
    }

    async fn delete(&self, upload_id: Uuid) -> Result<bool, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let deleted = diesel::delete(document_uploads::table.find(upload_id))
                .execute(conn)
                .map_err(db_error("Failed to delete upload"))?;
            Ok(deleted > 0)
        })
        .await
    }
}
