//! Response DTOs.

use serde::{Deserialize, Serialize};

use wagate_realtime::RealtimeMetricsSnapshot;
use wagate_worker::DeliveryMetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Readiness response with runtime counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `connected` or `unavailable`.
    pub database: String,
    /// Loaded tenants.
    pub tenants: usize,
    /// Open push connections.
    pub push_connections: usize,
    pub delivery: DeliveryMetricsSnapshot,
    pub push: RealtimeMetricsSnapshot,
}

/// Result of toggling a webhook option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleWebhookResponse {
    pub url: String,
    pub option: String,
    /// `true`, `false`, or empty when the option went back to unset.
    pub value: String,
}
