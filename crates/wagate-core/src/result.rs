//! Convenience result type alias for Wagate.

use crate::error::AppError;

/// A specialized `Result` type for Wagate operations.
pub type AppResult<T> = Result<T, AppError>;
