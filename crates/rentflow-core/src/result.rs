//! Convenience result type alias for RentFlow.

use crate::error::AppError;

/// A specialized `Result` type for RentFlow operations.
pub type AppResult<T> = Result<T, AppError>;
