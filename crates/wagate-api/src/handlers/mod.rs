//! HTTP handlers.

pub mod health;
pub mod message;
pub mod tenant;
pub mod webhook;
pub mod ws;

use validator::Validate;
use wagate_core::error::AppError;

use crate::error::ApiError;

/// Runs `validator` rules, mapping failures to a 400.
pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()).into())
}
