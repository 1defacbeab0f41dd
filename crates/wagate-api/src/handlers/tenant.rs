//! Tenant handlers: info, pairing, deletion.

use axum::Json;
use axum::extract::State;

use wagate_core::error::AppError;
use wagate_service::TenantInfo;

use super::validate;
use crate::dto::request::PairRequest;
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::TenantToken;
use crate::state::AppState;

/// GET /api/{token}/info
pub async fn info(
    State(state): State<AppState>,
    token: TenantToken,
) -> Result<Json<ApiResponse<TenantInfo>>, ApiError> {
    let runtime = state.registry.get(&token)?;
    Ok(Json(ApiResponse::ok(runtime.info())))
}

/// POST /api/{token}/pair
pub async fn pair(
    State(state): State<AppState>,
    token: TenantToken,
    Json(req): Json<PairRequest>,
) -> Result<Json<ApiResponse<TenantInfo>>, ApiError> {
    validate(&req)?;
    let runtime = state.registry.pair(&token, &req.wid).await?;
    Ok(Json(ApiResponse::ok(runtime.info())))
}

/// DELETE /api/{token}
pub async fn delete(
    State(state): State<AppState>,
    token: TenantToken,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !state.registry.delete(&token).await? {
        return Err(AppError::not_found(format!("tenant '{}' not found", &*token)).into());
    }
    Ok(Json(ApiResponse::ok(MessageResponse::new("Tenant deleted"))))
}
