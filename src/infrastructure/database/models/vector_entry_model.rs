use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::infrastructure::database::schema::vector_entries;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = vector_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewVectorEntryModel {
    pub collection: String,
    pub id: String,
    pub document_id: Uuid,
    pub content: String,
    pub metadata: serde_json::Value,
    pub embedding: Vector,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vector_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VectorEntryModel {
    pub id: String,
    pub document_id: Uuid,
    pub content: String,
    pub metadata: serde_json::Value,
}
