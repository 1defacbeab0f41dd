//! Webhook subscription handlers.

use axum::Json;
use axum::extract::{Query, State};

use wagate_core::error::AppError;
use wagate_entity::webhook::{WebhookConfig, WebhookOption};

use super::validate;
use crate::dto::request::{ToggleWebhookRequest, WebhookUrlQuery};
use crate::dto::response::{ApiResponse, MessageResponse, ToggleWebhookResponse};
use crate::error::ApiError;
use crate::extractors::TenantToken;
use crate::state::AppState;

/// GET /api/{token}/webhooks
pub async fn list(
    State(state): State<AppState>,
    token: TenantToken,
) -> Result<Json<ApiResponse<Vec<WebhookConfig>>>, ApiError> {
    let runtime = state.registry.get(&token)?;
    Ok(Json(ApiResponse::ok(runtime.webhooks())))
}

/// POST /api/{token}/webhooks
///
/// Adds the webhook, or updates the one with the same url.
pub async fn add(
    State(state): State<AppState>,
    token: TenantToken,
    Json(webhook): Json<WebhookConfig>,
) -> Result<Json<ApiResponse<WebhookConfig>>, ApiError> {
    let saved = state.registry.add_webhook(&token, webhook).await?;
    Ok(Json(ApiResponse::ok(saved)))
}

/// DELETE /api/{token}/webhooks?url=
pub async fn remove(
    State(state): State<AppState>,
    token: TenantToken,
    Query(query): Query<WebhookUrlQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate(&query)?;
    if !state.registry.remove_webhook(&token, &query.url).await? {
        return Err(AppError::not_found(format!("webhook '{}' not found", query.url)).into());
    }
    Ok(Json(ApiResponse::ok(MessageResponse::new("Webhook removed"))))
}

/// POST /api/{token}/webhooks/toggle
pub async fn toggle(
    State(state): State<AppState>,
    token: TenantToken,
    Json(req): Json<ToggleWebhookRequest>,
) -> Result<Json<ApiResponse<ToggleWebhookResponse>>, ApiError> {
    validate(&req)?;
    let option: WebhookOption = req.option.parse()?;
    let value = state.registry.toggle_webhook(&token, &req.url, option).await?;
    Ok(Json(ApiResponse::ok(ToggleWebhookResponse {
        url: req.url,
        option: option.as_str().to_string(),
        value,
    })))
}
