use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::ProcessingTask;
use crate::domain::repositories::{RepositoryError, TaskRepository};
use crate::domain::value_objects::TaskStatus;
use crate::infrastructure::database::connection::{DbPool, db_error, with_connection};
use crate::infrastructure::database::models::{TaskModel, TaskTransitionModel};
use crate::infrastructure::database::schema::processing_tasks;

pub struct PostgresTaskRepository {
    pool: DbPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(model: TaskModel) -> Result<ProcessingTask, RepositoryError> {
    ProcessingTask::try_from(model).map_err(RepositoryError::Conversion)
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn save(&self, task: &ProcessingTask) -> Result<(), RepositoryError> {
        let model = TaskModel::from(task);

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(processing_tasks::table)
                .values(&model)
                .execute(conn)
                .map_err(db_error("Failed to save task"))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<ProcessingTask>, RepositoryError> {
        let model = with_connection(&self.pool, move |conn| {
            processing_tasks::table
                .find(task_id)
                .select(TaskModel::as_select())
                .first(conn)
                .optional()
                .map_err(db_error("Failed to find task"))
        })
        .await?;

        model.map(to_domain).transpose()
    }

    /// Conditional update guarded by the stored status, so two writers racing
    /// on the same task cannot both succeed.
    async fn compare_and_set(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> Result<bool, RepositoryError> {
        let changes = TaskTransitionModel::from(task);
        let task_id = task.id();

        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(
                processing_tasks::table
                    .filter(processing_tasks::id.eq(task_id))
                    .filter(processing_tasks::status.eq(expected.as_str())),
            )
            .set(&changes)
            .execute(conn)
            .map_err(db_error("Failed to update task status"))?;
            Ok(updated == 1)
        })
        .await
    }

    async fn set_external_task_id(
        &self,
        task_id: Uuid,
        external_task_id: &str,
    ) -> Result<bool, RepositoryError> {
        let external_task_id = external_task_id.to_string();

        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(processing_tasks::table.find(task_id))
                .set((
                    processing_tasks::external_task_id.eq(Some(external_task_id)),
                    processing_tasks::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(db_error("Failed to attach queue handle"))?;
            Ok(updated > 0)
        })
        .await
    }

    async fn set_document_id(
        &self,
        task_id: Uuid,
        document_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        with_connection(&self.pool, move |conn| {
            let updated = diesel::update(processing_tasks::table.find(task_id))
                .set((
                    processing_tasks::document_id.eq(Some(document_id)),
                    processing_tasks::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(db_error("Failed to link document to task"))?;
            Ok(updated > 0)
        })
        .await
    }

    async fn list_for_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
        task_ids: Option<&[Uuid]>,
    ) -> Result<Vec<ProcessingTask>, RepositoryError> {
        let task_ids = task_ids.map(<[Uuid]>::to_vec);

        let models = with_connection(&self.pool, move |conn| {
            let mut query = processing_tasks::table
                .filter(processing_tasks::knowledge_base_id.eq(knowledge_base_id))
                .into_boxed();
            if let Some(ids) = task_ids {
                query = query.filter(processing_tasks::id.eq_any(ids));
            }
            query
                .order(processing_tasks::created_at.asc())
                .select(TaskModel::as_select())
                .load(conn)
                .map_err(db_error("Failed to list tasks"))
        })
        .await?;

        models.into_iter().map(to_domain).collect()
    }
}
