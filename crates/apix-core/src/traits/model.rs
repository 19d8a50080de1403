//! The data-access contract a repository is built on.
//!
//! A [`Model`] is the handle for one entity type in some store: it looks
//! entities up, persists them, and turns a [`FilterRequest`] into a
//! [`FilteredQuery`] that can be paginated. The generic repository never
//! touches the store directly.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::result::AppResult;
use crate::types::{
    ActorContext, Attributes, EntityId, FilterRequest, LengthAwarePage, PageRequest,
    QueryExtras, QueryScope, SimplePage,
};

/// A persisted record identified by a primary key.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The primary key.
    fn id(&self) -> EntityId;
}

/// A filtered result set that has not been fetched yet.
#[async_trait]
pub trait FilteredQuery<E>: Send + Sync + Sized
where
    E: Send + 'static,
{
    /// Fetch one page together with the total number of matches.
    async fn paginate(self, request: PageRequest) -> AppResult<LengthAwarePage<E>>;

    /// Fetch one page without counting, reporting only whether more follow.
    async fn simple_paginate(self, request: PageRequest) -> AppResult<SimplePage<E>>;
}

/// Data-access object for one entity type.
#[async_trait]
pub trait Model: Send + Sync + 'static {
    /// The entity this model manages.
    type Entity: Entity;
    /// Query produced by [`Model::filter`].
    type Query: FilteredQuery<Self::Entity>;

    /// Model name, used in log fields and error messages.
    fn name(&self) -> &str;

    /// Build a query from the caller's request.
    ///
    /// `scope` constraints apply before the request's own filters. `actor`
    /// lets the model restrict results to what that user may see. `extras`
    /// carries store-specific options.
    async fn filter(
        &self,
        request: &FilterRequest,
        actor: Option<&ActorContext>,
        scope: Option<&QueryScope>,
        extras: &QueryExtras,
    ) -> AppResult<Self::Query>;

    /// Find an entity by primary key.
    async fn find(&self, id: EntityId) -> AppResult<Option<Self::Entity>>;

    /// Persist a new entity and return it with generated fields filled in.
    async fn create(&self, attributes: &Attributes) -> AppResult<Self::Entity>;

    /// Merge `attributes` into an existing entity, persist, and return the
    /// updated entity. Fields not mentioned keep their values.
    async fn update(&self, entity: Self::Entity, attributes: &Attributes)
    -> AppResult<Self::Entity>;

    /// Delete an entity. Returns `true` if a record was removed.
    async fn delete(&self, entity: &Self::Entity) -> AppResult<bool>;
}
