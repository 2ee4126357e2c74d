use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentRepository, RepositoryError};
use crate::domain::value_objects::FileHash;
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::DocumentModel;
use crate::infrastructure::database::schema::{document_chunks, document_uploads, documents};

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(model: DocumentModel) -> Result<Document, RepositoryError> {
    Document::try_from(model).map_err(RepositoryError::Conversion)
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn find_by_id(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, RepositoryError> {
        let model = with_connection(&self.pool, move |conn| {
            documents::table
                .filter(documents::id.eq(document_id))
                .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find document"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    async fn find_by_name_and_hash(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
        file_hash: &FileHash,
    ) -> Result<Option<Document>, RepositoryError> {
        let file_name = file_name.to_string();
        let file_hash = file_hash.as_str().to_string();

        let model = with_connection(&self.pool, move |conn| {
            documents::table
                .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                .filter(documents::file_name.eq(file_name))
                .filter(documents::file_hash.eq(file_hash))
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find document by hash"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    async fn find_by_name(
        &self,
        knowledge_base_id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let file_name = file_name.to_string();

        let model = with_connection(&self.pool, move |conn| {
            documents::table
                .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                .filter(documents::file_name.eq(file_name))
                .select(DocumentModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find document by name"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    async fn list_by_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
    ) -> Result<Vec<Document>, RepositoryError> {
        let models = with_connection(&self.pool, move |conn| {
            documents::table
                .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                .order(documents::created_at.asc())
                .select(DocumentModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to list documents"))
        })
        .await?;

        models.into_iter().map(to_domain).collect()
    }

    async fn upsert(&self, document: &Document) -> Result<Document, RepositoryError> {
        let model = DocumentModel::from(document);

        let stored = with_connection(&self.pool, move |conn| {
            diesel::insert_into(documents::table)
                .values(&model)
                .on_conflict((documents::knowledge_base_id, documents::file_name))
                .do_update()
                .set((
                    documents::file_path.eq(&model.file_path),
                    documents::file_size.eq(model.file_size),
                    documents::content_type.eq(&model.content_type),
                    documents::file_hash.eq(&model.file_hash),
                    documents::updated_at.eq(Utc::now()),
                ))
                .returning(DocumentModel::as_returning())
                .get_result(conn)
                .map_err(db_error("Failed to upsert document"))
        })
        .await?;

        to_domain(stored)
    }

    async fn delete_cascade(
        &self,
        document_id: Uuid,
        upload_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        with_connection(&self.pool, move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    document_chunks::table.filter(document_chunks::document_id.eq(document_id)),
                )
                .execute(conn)?;
                diesel::delete(documents::table.find(document_id)).execute(conn)?;
                if let Some(upload_id) = upload_id {
                    diesel::delete(document_uploads::table.find(upload_id)).execute(conn)?;
                }
                Ok(())
            })
            .map_err(db_error("Failed to delete document"))
        })
        .await
    }
}
