//! Core traits defined in `apix-core` and implemented by models and
//! entity-specific repositories.

pub mod hooks;
pub mod model;

pub use hooks::{NoHooks, RepositoryHooks};
pub use model::{Entity, FilteredQuery, Model};
