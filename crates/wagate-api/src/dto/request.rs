//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query of `GET receive`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiveQuery {
    /// Unix seconds. Only records strictly newer are returned.
    pub timestamp: Option<i64>,
}

/// Query of `DELETE message/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokeQuery {
    /// Treat the id as a prefix.
    #[serde(default)]
    pub prefix: bool,
}

/// Query of `DELETE webhooks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookUrlQuery {
    #[validate(length(min = 1, message = "Webhook url is required"))]
    pub url: String,
}

/// Body of `POST webhooks/toggle`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToggleWebhookRequest {
    /// Webhook to change.
    #[validate(length(min = 1, message = "Webhook url is required"))]
    pub url: String,
    /// One of groups, broadcasts, readreceipts, calls, forwardinternal.
    #[validate(length(min = 1, message = "Option is required"))]
    pub option: String,
}

/// Body of `POST pair`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairRequest {
    /// Session identity confirmed by the network.
    #[validate(length(min = 1, message = "wid is required"))]
    pub wid: String,
}
