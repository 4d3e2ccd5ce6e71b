//! Convenience result type alias for Kura.

use crate::error::AppError;

/// A specialized `Result` type for Kura operations.
pub type AppResult<T> = Result<T, AppError>;
