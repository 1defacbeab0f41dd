//! Typed path parameter helpers.

use std::collections::HashMap;

use wagate_core::error::AppError;

use crate::error::ApiError;

/// Reads a named segment from the captured path parameters.
pub fn path_param(params: &HashMap<String, String>, name: &str) -> Result<String, ApiError> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(format!("Missing path parameter: {name}")).into())
}
