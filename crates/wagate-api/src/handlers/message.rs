//! Message handlers: polling, lookup, revoke and send.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::DateTime;

use wagate_core::error::AppError;
use wagate_entity::message::MessageRecord;
use wagate_service::SendResponse;
use wagate_service::send::SendRequest;
use wagate_service::tenant::RevokeReport;

use crate::dto::request::{ReceiveQuery, RevokeQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{TenantToken, path_param};
use crate::state::AppState;

/// GET /api/{token}/receive?timestamp=<unix>
pub async fn receive(
    State(state): State<AppState>,
    token: TenantToken,
    Query(query): Query<ReceiveQuery>,
) -> Result<Json<ApiResponse<Vec<MessageRecord>>>, ApiError> {
    let runtime = state.registry.get(&token)?;
    let since = match query.timestamp {
        Some(secs) => Some(
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| AppError::validation(format!("Invalid timestamp: {secs}")))?,
        ),
        None => None,
    };
    Ok(Json(ApiResponse::ok(runtime.receive(since))))
}

/// GET /api/{token}/message/{id}
///
/// A cache miss is an empty success, not an error.
pub async fn get_message(
    State(state): State<AppState>,
    token: TenantToken,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Option<MessageRecord>>>, ApiError> {
    let id = path_param(&params, "id")?;
    let runtime = state.registry.get(&token)?;
    Ok(Json(ApiResponse::ok(runtime.get_message(&id))))
}

/// DELETE /api/{token}/message/{id}?prefix=true
pub async fn revoke(
    State(state): State<AppState>,
    token: TenantToken,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<RevokeQuery>,
) -> Result<Json<ApiResponse<RevokeReport>>, ApiError> {
    let id = path_param(&params, "id")?;
    let runtime = state.registry.get(&token)?;
    let report = runtime.revoke(&id, query.prefix).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/{token}/send
pub async fn send(
    State(state): State<AppState>,
    token: TenantToken,
    Json(req): Json<SendRequest>,
) -> Result<Json<ApiResponse<SendResponse>>, ApiError> {
    let record = state.registry.send(&token, req).await?;
    Ok(Json(ApiResponse::ok(SendResponse::from(&record))))
}
