//! Generic CRUD and filtered-listing facade over one model.

use std::sync::Arc;

use tracing::{debug, info};

use apix_core::config::PaginationConfig;
use apix_core::error::AppError;
use apix_core::result::AppResult;
use apix_core::traits::{Entity, FilteredQuery, Model, NoHooks, RepositoryHooks};
use apix_core::types::{
    ActorContext, Attributes, EntityId, FilterRequest, Page, PageRequest, PaginationMode,
    QueryExtras, QueryScope,
};

use crate::registry::ModelRegistry;

/// Repository for one entity type.
///
/// The model, hooks, and pagination defaults are fixed at construction and
/// never mutated afterwards, so one instance can serve many requests. No
/// entity is kept between calls.
pub struct GenericRepository<M, H = NoHooks>
where
    M: Model,
    H: RepositoryHooks<M::Entity>,
{
    /// The data-access object for the entity.
    model: Arc<M>,
    /// Lifecycle hooks.
    hooks: H,
    /// Defaults for `list`.
    pagination: PaginationConfig,
}

impl<M: Model> GenericRepository<M, NoHooks> {
    /// Creates a repository bound to `model`, without hooks.
    pub fn new(model: Arc<M>, pagination: PaginationConfig) -> Self {
        Self::with_hooks(model, NoHooks, pagination)
    }
}

impl<M, H> GenericRepository<M, H>
where
    M: Model,
    H: RepositoryHooks<M::Entity>,
{
    /// Creates a repository bound to `model` with the given hooks.
    pub fn with_hooks(model: Arc<M>, hooks: H, pagination: PaginationConfig) -> Self {
        Self {
            model,
            hooks,
            pagination,
        }
    }

    /// Creates a repository whose model is resolved from its name.
    ///
    /// `PostRepository` resolves to whatever `registry` holds for `Post`
    /// under its namespace. Fails with a configuration error when nothing
    /// matches or the model cannot be built.
    pub fn from_registry(
        registry: &ModelRegistry<M>,
        repository_name: &str,
        hooks: H,
        pagination: PaginationConfig,
    ) -> AppResult<Self> {
        let model = registry.resolve(repository_name)?;
        Ok(Self::with_hooks(model, hooks, pagination))
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The pagination mode for a request's `with_pages` flag, falling back
    /// to the configured default.
    pub fn pagination_mode(&self, with_pages: Option<bool>) -> PaginationMode {
        match with_pages {
            Some(flag) => PaginationMode::from_with_pages(flag),
            None => self.pagination.default_mode(),
        }
    }

    fn page_request(&self, request: &FilterRequest) -> PageRequest {
        PageRequest::bounded(
            request.page.unwrap_or(1),
            request.per_page.unwrap_or(self.pagination.per_page),
            self.pagination.max_per_page,
        )
    }

    /// Lists entities matching `request`.
    ///
    /// The request is handed to the model's filter as-is; only its
    /// `with_pages`, `per_page`, and `page` keys are read here. No match
    /// yields an empty page.
    pub async fn list(
        &self,
        request: &FilterRequest,
        actor: Option<&ActorContext>,
        scope: Option<&QueryScope>,
        extras: &QueryExtras,
    ) -> AppResult<Page<M::Entity>> {
        let mode = self.pagination_mode(request.with_pages);
        let page_request = self.page_request(request);

        debug!(
            model = self.model.name(),
            ?mode,
            page = page_request.page,
            per_page = page_request.per_page,
            "Listing entities"
        );

        let query = self.model.filter(request, actor, scope, extras).await?;

        let page = match mode {
            PaginationMode::LengthAware => Page::LengthAware(query.paginate(page_request).await?),
            PaginationMode::Simple => Page::Simple(query.simple_paginate(page_request).await?),
        };
        Ok(page)
    }

    /// Finds an entity by primary key, returning `None` when absent.
    pub async fn find(&self, id: EntityId) -> AppResult<Option<M::Entity>> {
        debug!(model = self.model.name(), %id, "Finding entity");
        self.model.find(id).await
    }

    /// Gets an entity by primary key.
    ///
    /// Fails with a not-found error when absent.
    pub async fn get(&self, id: EntityId) -> AppResult<M::Entity> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} {id} not found", self.model.name())))
    }

    /// Creates an entity.
    ///
    /// `before_create` may rewrite the attributes; what it returns is what
    /// gets persisted and what `after_created` sees.
    pub async fn create(&self, attributes: Attributes) -> AppResult<M::Entity> {
        let attributes = self.hooks.before_create(attributes).await?;

        let entity = self.model.create(&attributes).await?;

        self.hooks.after_created(&entity, &attributes).await?;

        info!(model = self.model.name(), id = %entity.id(), "Entity created");
        Ok(entity)
    }

    /// Updates the entity with the given primary key.
    ///
    /// Fails with a not-found error when absent.
    pub async fn update_by_id(
        &self,
        id: EntityId,
        attributes: Attributes,
    ) -> AppResult<M::Entity> {
        let entity = self.get(id).await?;
        self.update_entity(entity, attributes).await
    }

    /// Updates an already-loaded entity.
    ///
    /// Returns the entity as persisted, with fields not mentioned in
    /// `attributes` unchanged.
    pub async fn update_entity(
        &self,
        entity: M::Entity,
        attributes: Attributes,
    ) -> AppResult<M::Entity> {
        let attributes = self.hooks.before_update(&entity, attributes).await?;

        let updated = self.model.update(entity, &attributes).await?;

        self.hooks.after_updated(&updated, &attributes).await?;

        info!(model = self.model.name(), id = %updated.id(), "Entity updated");
        Ok(updated)
    }

    /// Deletes the entity with the given primary key.
    ///
    /// Fails with a not-found error when absent, without touching the store.
    pub async fn delete_by_id(&self, id: EntityId) -> AppResult<bool> {
        let entity = self.get(id).await?;
        self.delete_entity(&entity).await
    }

    /// Deletes an already-loaded entity. Returns whether a record was
    /// removed.
    pub async fn delete_entity(&self, entity: &M::Entity) -> AppResult<bool> {
        let deleted = self.model.delete(entity).await?;
        info!(model = self.model.name(), id = %entity.id(), deleted, "Entity deleted");
        Ok(deleted)
    }
}

impl<M, H> Clone for GenericRepository<M, H>
where
    M: Model,
    H: RepositoryHooks<M::Entity> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            hooks: self.hooks.clone(),
            pagination: self.pagination.clone(),
        }
    }
}

impl<M, H> std::fmt::Debug for GenericRepository<M, H>
where
    M: Model,
    H: RepositoryHooks<M::Entity>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericRepository")
            .field("model", &self.model.name())
            .field("pagination", &self.pagination)
            .finish()
    }
}
