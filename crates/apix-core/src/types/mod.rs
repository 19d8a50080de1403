//! Core type definitions used across the Apix workspace.

pub mod actor;
pub mod filter;
pub mod id;
pub mod pagination;
pub mod record;
pub mod sorting;

pub use actor::ActorContext;
pub use filter::{FilterField, FilterOp, FilterRequest, FilterValue, QueryExtras, QueryScope};
pub use id::EntityId;
pub use pagination::{LengthAwarePage, Page, PageRequest, PaginationMode, SimplePage};
pub use record::Record;
pub use sorting::{SortDirection, SortField};

/// Mass-assignable field values passed to create, update, and hooks.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
