//! Convenience result type alias for Apix.

use crate::error::AppError;

/// A specialized `Result` type for repository and model operations.
pub type AppResult<T> = Result<T, AppError>;
