//! A schemaless entity for models that are not bound to a Rust struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Attributes;
use super::id::EntityId;
use crate::traits::Entity;

/// A persisted record whose fields are kept as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key.
    pub id: EntityId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// All other fields.
    #[serde(flatten)]
    pub data: Attributes,
}

impl Record {
    /// Look up a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

impl Entity for Record {
    fn id(&self) -> EntityId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_collects_fields() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "title": "Hello",
            "views": 9
        }))
        .unwrap();

        assert_eq!(record.id(), EntityId(3));
        assert_eq!(record.get("title"), Some(&Value::from("Hello")));
        assert_eq!(record.data.len(), 2);
    }
}
