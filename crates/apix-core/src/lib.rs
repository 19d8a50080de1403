//! # apix-core
//!
//! Core crate for Apix. Contains the model and hook traits that the
//! generic repository is built on, configuration schemas, filter and
//! pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Apix crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
