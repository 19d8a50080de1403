//! Lifecycle hooks run by the generic repository around writes.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::traits::model::Entity;
use crate::types::Attributes;

/// Extension points around `create` and `update`.
///
/// Every method defaults to a no-op. The `before_*` hooks return the
/// attributes that will actually be persisted, so they can normalize or
/// derive fields. The `after_*` hooks observe the persisted entity and the
/// attributes that were written. Any error aborts the operation and is
/// returned to the caller as-is; writes already made by the store are not
/// rolled back.
#[async_trait]
pub trait RepositoryHooks<E: Entity>: Send + Sync + 'static {
    /// Runs before a new entity is persisted.
    async fn before_create(&self, attributes: Attributes) -> AppResult<Attributes> {
        Ok(attributes)
    }

    /// Runs after a new entity is persisted.
    async fn after_created(&self, _entity: &E, _attributes: &Attributes) -> AppResult<()> {
        Ok(())
    }

    /// Runs before an existing entity is updated.
    async fn before_update(&self, _entity: &E, attributes: Attributes) -> AppResult<Attributes> {
        Ok(attributes)
    }

    /// Runs after an existing entity is updated.
    async fn after_updated(&self, _entity: &E, _attributes: &Attributes) -> AppResult<()> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<E: Entity> RepositoryHooks<E> for NoHooks {}
