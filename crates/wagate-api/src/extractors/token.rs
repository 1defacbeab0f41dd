//! `TenantToken` extractor: which tenant a request is for.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use wagate_core::error::AppError;

use crate::error::ApiError;

/// Header that may carry the tenant token instead of the path.
pub const TOKEN_HEADER: &str = "x-wagate-token";

/// Tenant token taken from the `{token}` path segment or the token header.
#[derive(Debug, Clone)]
pub struct TenantToken(pub String);

impl std::ops::Deref for TenantToken {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for TenantToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(Path(params)) =
            Path::<HashMap<String, String>>::from_request_parts(parts, state).await
        {
            if let Some(token) = params.get("token").map(|t| t.trim()).filter(|t| !t.is_empty()) {
                return Ok(Self(token.to_string()));
            }
        }

        parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self(t.to_string()))
            .ok_or_else(|| AppError::authentication("Missing tenant token").into())
    }
}
