use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KnowledgeBase {
    pub fn new(name: String, description: Option<String>) -> Result<Self, String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("Knowledge base name cannot be empty".to_string());
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_database(
        id: Uuid,
        name: String,
        description: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial edit. `None` leaves a field alone; an empty
    /// description clears it.
    pub fn apply_update(
        &mut self,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), String> {
        if let Some(name) = name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err("Knowledge base name cannot be empty".to_string());
            }
            self.name = name;
        }
        if let Some(description) = description {
            self.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Name of the vector collection holding this knowledge base's chunks.
    pub fn collection_name(&self) -> String {
        collection_name(self.id)
    }

    /// Blob key prefix under which every object of this knowledge base lives.
    pub fn storage_prefix(&self) -> String {
        storage_prefix(self.id)
    }
}

pub fn collection_name(kb_id: Uuid) -> String {
    format!("kb_{}", kb_id)
}

pub fn storage_prefix(kb_id: Uuid) -> String {
    format!("kb_{}/", kb_id)
}
