//! In-process model keeping rows as JSON objects.

mod matching;
pub mod model;
pub mod query;

pub use model::MemoryModel;
pub use query::MemoryQuery;
