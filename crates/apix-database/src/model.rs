//! PostgreSQL implementation of the model contract.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use apix_core::error::{AppError, ErrorKind};
use apix_core::result::AppResult;
use apix_core::traits::{Entity, Model};
use apix_core::types::{
    ActorContext, Attributes, EntityId, FilterRequest, FilterValue, QueryExtras, QueryScope,
};

use crate::query::PgQuery;
use crate::sql::{self, OrderTerm, Predicate, SELECT_COLUMNS};

/// Extras key narrowing a listing to the given ids.
pub const INCLUDE_IDS_EXTRA: &str = "include_ids";

/// Fields owned by the table's columns rather than `data`.
const GENERATED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// A row of a record table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RecordRow {
    id: i64,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    /// Merge the columns into `data` and deserialize the entity.
    pub(crate) fn into_entity<E: Entity>(self) -> AppResult<E> {
        let Value::Object(mut fields) = self.data else {
            return Err(AppError::serialization(format!(
                "Row {} has non-object data",
                self.id
            )));
        };
        fields.insert("id".to_string(), Value::from(self.id));
        fields.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        fields.insert(
            "updated_at".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Model over a record table (`id`, JSONB `data`, timestamps).
pub struct PgModel<E> {
    pool: PgPool,
    name: String,
    table: String,
    search_fields: Vec<String>,
    owner_field: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgModel<E> {
    /// Create a model for `table`. The table name must be a plain
    /// identifier.
    pub fn new(pool: PgPool, name: impl Into<String>, table: impl Into<String>) -> AppResult<Self> {
        let table = table.into();
        sql::validate_identifier(&table)?;
        Ok(Self {
            pool,
            name: name.into(),
            table,
            search_fields: Vec::new(),
            owner_field: None,
            _entity: PhantomData,
        })
    }

    /// Restrict `search` to these fields instead of every string field.
    pub fn with_search_fields<I, S>(mut self, fields: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        for field in &fields {
            sql::validate_identifier(field)?;
        }
        self.search_fields = fields;
        Ok(self)
    }

    /// Limit non-admin actors to rows whose `field` holds their user id.
    pub fn with_owner_field(mut self, field: impl Into<String>) -> AppResult<Self> {
        let field = field.into();
        sql::validate_identifier(&field)?;
        self.owner_field = Some(field);
        Ok(self)
    }

    /// The record table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The pool this model queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn db_error(&self, action: &str, err: sqlx::Error) -> AppError {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to {action} {}", self.name),
            err,
        )
    }

    fn predicates(
        &self,
        request: &FilterRequest,
        actor: Option<&ActorContext>,
        scope: Option<&QueryScope>,
        extras: &QueryExtras,
    ) -> AppResult<Vec<Predicate>> {
        let mut predicates = Vec::new();

        if let Some(value) = extras.get(INCLUDE_IDS_EXTRA) {
            let ids = value
                .as_array()
                .and_then(|items| items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>())
                .ok_or_else(|| {
                    AppError::validation(format!("'{INCLUDE_IDS_EXTRA}' must be an array of integers"))
                })?;
            predicates.push(Predicate::ids(ids));
        }

        if let Some(scope) = scope {
            for constraint in &scope.constraints {
                predicates.push(Predicate::constraint(constraint)?);
            }
        }

        for (field, value) in &request.filters {
            predicates.push(Predicate::equals(field, value)?);
        }

        if let Some(term) = request.search.as_deref().filter(|t| !t.is_empty()) {
            predicates.push(Predicate::search(term, &self.search_fields)?);
        }

        if let (Some(field), Some(actor)) = (&self.owner_field, actor) {
            if !actor.is_admin() {
                predicates.push(Predicate::equals(
                    field,
                    &FilterValue::String(actor.user_id.to_string()),
                )?);
            }
        }

        Ok(predicates)
    }
}

fn without_generated(attributes: &Attributes) -> Value {
    Value::Object(
        attributes
            .iter()
            .filter(|(key, _)| !GENERATED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

#[async_trait]
impl<E: Entity> Model for PgModel<E> {
    type Entity = E;
    type Query = PgQuery<E>;

    fn name(&self) -> &str {
        &self.name
    }

    async fn filter(
        &self,
        request: &FilterRequest,
        actor: Option<&ActorContext>,
        scope: Option<&QueryScope>,
        extras: &QueryExtras,
    ) -> AppResult<PgQuery<E>> {
        let predicates = self.predicates(request, actor, scope, extras)?;
        let order = request
            .sort
            .iter()
            .map(OrderTerm::parse)
            .collect::<AppResult<Vec<_>>>()?;

        debug!(model = %self.name, conditions = predicates.len(), "Built filter");
        Ok(PgQuery::new(
            self.pool.clone(),
            self.table.clone(),
            predicates,
            order,
        ))
    }

    async fn find(&self, id: EntityId) -> AppResult<Option<E>> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM {} WHERE id = $1", self.table);
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.db_error("find", e))?
            .map(RecordRow::into_entity)
            .transpose()
    }

    async fn create(&self, attributes: &Attributes) -> AppResult<E> {
        let query = format!(
            "INSERT INTO {} (data) VALUES ($1) RETURNING {SELECT_COLUMNS}",
            self.table
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(without_generated(attributes))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.db_error("create", e))?
            .into_entity()
    }

    async fn update(&self, entity: E, attributes: &Attributes) -> AppResult<E> {
        let id = entity.id();
        let query = format!(
            "UPDATE {} SET data = data || $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {SELECT_COLUMNS}",
            self.table
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(without_generated(attributes))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.db_error("update", e))?
            .ok_or_else(|| AppError::not_found(format!("{} {id} not found", self.name)))?
            .into_entity()
    }

    async fn delete(&self, entity: &E) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&query)
            .bind(entity.id())
            .execute(&self.pool)
            .await
            .map_err(|e| self.db_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}
