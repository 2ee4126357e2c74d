use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::KnowledgeBase;
use crate::infrastructure::database::schema::knowledge_bases;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = knowledge_bases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct KnowledgeBaseModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&KnowledgeBase> for KnowledgeBaseModel {
    fn from(kb: &KnowledgeBase) -> Self {
        Self {
            id: kb.id(),
            name: kb.name().to_string(),
            description: kb.description().map(str::to_string),
            created_at: kb.created_at(),
            updated_at: kb.updated_at(),
        }
    }
}

impl From<KnowledgeBaseModel> for KnowledgeBase {
    fn from(model: KnowledgeBaseModel) -> Self {
        KnowledgeBase::from_database(
            model.id,
            model.name,
            model.description,
            model.created_at,
            model.updated_at,
        )
    }
}
