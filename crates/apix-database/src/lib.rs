//! # apix-database
//!
//! PostgreSQL connection management and [`PgModel`], a model that keeps
//! each entity type in a record table of `id`, JSONB `data`, and
//! timestamps.

pub mod connection;
pub mod migration;
pub mod model;
pub mod query;
mod sql;

pub use connection::DatabasePool;
pub use model::PgModel;
pub use query::PgQuery;
