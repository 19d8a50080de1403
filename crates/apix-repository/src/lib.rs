//! # apix-repository
//!
//! The [`GenericRepository`] facade: list with filtering and pagination,
//! get, create, update, and delete over any [`apix_core::traits::Model`],
//! with [`apix_core::traits::RepositoryHooks`] around writes.
//!
//! Also provides [`ModelRegistry`] for resolving a model from a repository
//! name, and [`MemoryModel`], an in-process model.

pub mod memory;
pub mod registry;
pub mod repository;

pub use memory::{MemoryModel, MemoryQuery};
pub use registry::ModelRegistry;
pub use repository::GenericRepository;
