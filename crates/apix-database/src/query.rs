//! Filtered query over a record table.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use apix_core::error::{AppError, ErrorKind};
use apix_core::result::AppResult;
use apix_core::traits::{Entity, FilteredQuery};
use apix_core::types::{LengthAwarePage, PageRequest, SimplePage};

use crate::model::RecordRow;
use crate::sql::{OrderTerm, Predicate, SELECT_COLUMNS};

/// Query built by [`crate::PgModel`]'s filter; runs when paginated.
pub struct PgQuery<E> {
    pool: PgPool,
    table: String,
    predicates: Vec<Predicate>,
    order: Vec<OrderTerm>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgQuery<E> {
    pub(crate) fn new(
        pool: PgPool,
        table: String,
        predicates: Vec<Predicate>,
        order: Vec<OrderTerm>,
    ) -> Self {
        Self {
            pool,
            table,
            predicates,
            order,
            _entity: PhantomData,
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE (" } else { " AND (" });
            predicate.push_to(qb);
            qb.push(")");
        }
    }

    /// `SELECT COUNT(*)` over the matched rows.
    pub fn count_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_where(&mut qb);
        qb
    }

    /// `SELECT` of one window of the matched rows, in order.
    pub fn select_builder(&self, limit: u64, offset: u64) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM {}", self.table));
        self.push_where(&mut qb);

        qb.push(" ORDER BY ");
        for term in &self.order {
            qb.push(term.as_str());
            qb.push(", ");
        }
        qb.push("id ASC");

        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        qb
    }

    async fn fetch(&self, limit: u64, offset: u64) -> AppResult<Vec<E>> {
        let mut qb = self.select_builder(limit, offset);
        let rows = qb
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to list rows of '{}'", self.table),
                    e,
                )
            })?;

        rows.into_iter().map(RecordRow::into_entity).collect()
    }
}

#[async_trait]
impl<E: Entity> FilteredQuery<E> for PgQuery<E> {
    async fn paginate(self, request: PageRequest) -> AppResult<LengthAwarePage<E>> {
        let mut count = self.count_builder();
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to count rows of '{}'", self.table),
                    e,
                )
            })?;

        debug!(table = %self.table, total, page = request.page, "Paginated rows");
        if total <= 0 {
            return Ok(LengthAwarePage::empty(&request));
        }

        let items = self.fetch(request.limit(), request.offset()).await?;
        Ok(LengthAwarePage::new(items, &request, total as u64))
    }

    async fn simple_paginate(self, request: PageRequest) -> AppResult<SimplePage<E>> {
        let items = self
            .fetch(request.limit().saturating_add(1), request.offset())
            .await?;

        debug!(table = %self.table, fetched = items.len(), page = request.page, "Paginated rows");
        Ok(SimplePage::from_lookahead(items, &request))
    }
}
