//! Convenience result type alias for Clubhouse.

use crate::error::AppError;

/// A specialized `Result` type for Clubhouse operations.
pub type AppResult<T> = Result<T, AppError>;
