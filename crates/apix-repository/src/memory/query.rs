//! Filtered, sorted snapshot of in-memory rows.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use apix_core::result::AppResult;
use apix_core::traits::{Entity, FilteredQuery};
use apix_core::types::{Attributes, LengthAwarePage, PageRequest, SimplePage};

/// Rows matched by [`super::MemoryModel`]'s filter, in final order.
pub struct MemoryQuery<E> {
    rows: Vec<Attributes>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> MemoryQuery<E> {
    pub(crate) fn new(rows: Vec<Attributes>) -> Self {
        Self {
            rows,
            _entity: PhantomData,
        }
    }

    /// Number of matched rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn slice(self, offset: u64, take: u64) -> AppResult<Vec<E>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(usize::MAX);
        self.rows
            .into_iter()
            .skip(offset)
            .take(take)
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl<E: Entity> FilteredQuery<E> for MemoryQuery<E> {
    async fn paginate(self, request: PageRequest) -> AppResult<LengthAwarePage<E>> {
        let total = self.rows.len() as u64;
        let items = self.slice(request.offset(), request.limit())?;
        Ok(LengthAwarePage::new(items, &request, total))
    }

    async fn simple_paginate(self, request: PageRequest) -> AppResult<SimplePage<E>> {
        let items = self.slice(request.offset(), request.limit().saturating_add(1))?;
        Ok(SimplePage::from_lookahead(items, &request))
    }
}
