//! In-memory implementation of the model contract.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use apix_core::error::AppError;
use apix_core::result::AppResult;
use apix_core::traits::{Entity, Model};
use apix_core::types::{
    ActorContext, Attributes, EntityId, FilterRequest, QueryExtras, QueryScope, SortField,
};

use super::matching;
use super::query::MemoryQuery;

/// Extras key narrowing a listing to the given ids.
pub const INCLUDE_IDS_EXTRA: &str = "include_ids";

/// Fields the model owns; callers cannot overwrite them.
const GENERATED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Model storing rows in process memory.
///
/// Rows are JSON objects carrying `id`, `created_at`, and `updated_at`
/// alongside the caller's attributes, and are deserialized into `E` on the
/// way out. Clones share the same rows.
pub struct MemoryModel<E> {
    name: String,
    rows: Arc<RwLock<BTreeMap<EntityId, Attributes>>>,
    next_id: Arc<AtomicI64>,
    search_fields: Vec<String>,
    owner_field: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> MemoryModel<E> {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            search_fields: Vec::new(),
            owner_field: None,
            _entity: PhantomData,
        }
    }

    /// Restrict `search` to these fields instead of every string field.
    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Limit non-admin actors to rows whose `field` holds their user id.
    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }

    /// Number of stored rows.
    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }

    fn materialize(row: &Attributes) -> AppResult<E> {
        serde_json::from_value(Value::Object(row.clone())).map_err(AppError::from)
    }

    fn visible_to(&self, row: &Attributes, actor: Option<&ActorContext>) -> bool {
        match (&self.owner_field, actor) {
            (Some(field), Some(actor)) if !actor.is_admin() => row
                .get(field)
                .and_then(Value::as_str)
                .map(|owner| owner == actor.user_id.to_string())
                .unwrap_or(false),
            _ => true,
        }
    }
}

impl<E> Clone for MemoryModel<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            rows: Arc::clone(&self.rows),
            next_id: Arc::clone(&self.next_id),
            search_fields: self.search_fields.clone(),
            owner_field: self.owner_field.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for MemoryModel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryModel")
            .field("name", &self.name)
            .field("search_fields", &self.search_fields)
            .field("owner_field", &self.owner_field)
            .finish_non_exhaustive()
    }
}

fn include_ids(extras: &QueryExtras) -> AppResult<Option<Vec<i64>>> {
    let Some(value) = extras.get(INCLUDE_IDS_EXTRA) else {
        return Ok(None);
    };
    let ids = value
        .as_array()
        .ok_or_else(|| AppError::validation(format!("'{INCLUDE_IDS_EXTRA}' must be an array")))?
        .iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| {
                AppError::validation(format!("'{INCLUDE_IDS_EXTRA}' must contain integers"))
            })
        })
        .collect::<AppResult<Vec<i64>>>()?;
    Ok(Some(ids))
}

#[async_trait]
impl<E: Entity> Model for MemoryModel<E> {
    type Entity = E;
    type Query = MemoryQuery<E>;

    fn name(&self) -> &str {
        &self.name
    }

    async fn filter(
        &self,
        request: &FilterRequest,
        actor: Option<&ActorContext>,
        scope: Option<&QueryScope>,
        extras: &QueryExtras,
    ) -> AppResult<MemoryQuery<E>> {
        let include = include_ids(extras)?;
        let rows = self.rows.read().await;

        let mut matched: Vec<Attributes> = rows
            .iter()
            .filter(|(id, _)| {
                include
                    .as_ref()
                    .map(|ids| ids.contains(&id.into_inner()))
                    .unwrap_or(true)
            })
            .map(|(_, row)| row)
            .filter(|row| {
                scope
                    .map(|s| {
                        s.constraints
                            .iter()
                            .all(|c| matching::matches_constraint(row, c))
                    })
                    .unwrap_or(true)
            })
            .filter(|row| {
                request
                    .filters
                    .iter()
                    .all(|(field, value)| matching::values_equal(row.get(field), value))
            })
            .filter(|row| {
                request
                    .search
                    .as_deref()
                    .map(|term| matching::matches_search(row, term, &self.search_fields))
                    .unwrap_or(true)
            })
            .filter(|row| self.visible_to(row, actor))
            .cloned()
            .collect();
        drop(rows);

        let sort: &[SortField] = &request.sort;
        matched.sort_by(|a, b| matching::compare_rows(a, b, sort));

        debug!(model = %self.name, matched = matched.len(), "Filtered rows");
        Ok(MemoryQuery::new(matched))
    }

    async fn find(&self, id: EntityId) -> AppResult<Option<E>> {
        let rows = self.rows.read().await;
        rows.get(&id).map(Self::materialize).transpose()
    }

    async fn create(&self, attributes: &Attributes) -> AppResult<E> {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Value::String(Utc::now().to_rfc3339());

        let mut row = attributes.clone();
        row.insert("id".to_string(), Value::from(id.into_inner()));
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        let entity = Self::materialize(&row)?;
        self.rows.write().await.insert(id, row);
        Ok(entity)
    }

    async fn update(&self, entity: E, attributes: &Attributes) -> AppResult<E> {
        let id = entity.id();
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("{} {id} not found", self.name)))?;

        let mut merged = row.clone();
        for (key, value) in attributes {
            if !GENERATED_FIELDS.contains(&key.as_str()) {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let updated = Self::materialize(&merged)?;
        *row = merged;
        Ok(updated)
    }

    async fn delete(&self, entity: &E) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(&entity.id()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apix_core::types::Record;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let model = MemoryModel::<Record>::new("Post");
        let a = model.create(&attrs(json!({"title": "a"}))).await.unwrap();
        let b = model.create(&attrs(json!({"title": "b", "id": 99}))).await.unwrap();
        assert_eq!(a.id, EntityId(1));
        assert_eq!(b.id, EntityId(2));
        assert_eq!(model.count().await, 2);
    }

    #[tokio::test]
    async fn test_update_ignores_generated_fields() {
        let model = MemoryModel::<Record>::new("Post");
        let post = model.create(&attrs(json!({"title": "a"}))).await.unwrap();
        let created_at = post.created_at;

        let updated = model
            .update(post, &attrs(json!({"id": 50, "created_at": "1999-01-01T00:00:00Z", "title": "b"})))
            .await
            .unwrap();

        assert_eq!(updated.id, EntityId(1));
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.get("title"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_include_ids_extra_must_be_array() {
        let model = MemoryModel::<Record>::new("Post");
        let extras = QueryExtras::new().with(INCLUDE_IDS_EXTRA, json!("1,2"));
        let result = model.filter(&FilterRequest::new(), None, None, &extras).await;
        assert!(result.is_err());
    }
}
