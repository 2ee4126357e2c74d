use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::KnowledgeBase;
use crate::domain::repositories::{KnowledgeBaseRepository, RepositoryError};
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::KnowledgeBaseModel;
use crate::infrastructure::database::schema::knowledge_bases;

pub struct PostgresKnowledgeBaseRepository {
    pool: DbPool,
}

impl PostgresKnowledgeBaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KnowledgeBaseRepository for PostgresKnowledgeBaseRepository {
    async fn save(&self, knowledge_base: &KnowledgeBase) -> Result<(), RepositoryError> {
        let model = KnowledgeBaseModel::from(knowledge_base);

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(knowledge_bases::table)
                .values(&model)
                .execute(conn)
                .map_err(db_error("Failed to save knowledge base"))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<KnowledgeBase>, RepositoryError> {
        let model = with_connection(&self.pool, move |conn| {
            knowledge_bases::table
                .find(id)
                .select(KnowledgeBaseModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find knowledge base"))
        })
        .await?;

        Ok(model.map(KnowledgeBase::from))
    }

    async fn update(&self, knowledge_base: &KnowledgeBase) -> Result<bool, RepositoryError> {
        let model = KnowledgeBaseModel::from(knowledge_base);

        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(knowledge_bases::table.find(model.id))
                .set((
                    knowledge_bases::name.eq(model.name),
                    knowledge_bases::description.eq(model.description),
                    knowledge_bases::updated_at.eq(model.updated_at),
                ))
                .execute(conn)
                .map_err(db_error("Failed to update knowledge base"))?;
            Ok(updated > 0)
        })
        .await
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<KnowledgeBase>, RepositoryError> {
        let models = with_connection(&self.pool, move |conn| {
            knowledge_bases::table
                .order(knowledge_bases::created_at.desc())
                .offset(skip)
                .limit(limit)
                .select(KnowledgeBaseModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to list knowledge bases"))
        })
        .await?;

        Ok(models.into_iter().map(KnowledgeBase::from).collect())
    }

    /// Documents, uploads and chunk records go with the row through
    /// `ON DELETE CASCADE`; tasks keep their history with the reference nulled.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let deleted = diesel::delete(knowledge_bases::table.find(id))
                .execute(conn)
                .map_err(db_error("Failed to delete knowledge base"))?;
            Ok(deleted > 0)
        })
        .await
    }
}
