//! Outbound webhook delivery configuration.

use serde::{Deserialize, Serialize};

/// Settings for the HTTP client used to post records to webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDeliveryConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// `User-Agent` header sent with each delivery.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bounded queue depth per subscriber. When full, new records are
    /// dropped for that subscriber only.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Accept self-signed or otherwise invalid TLS certificates.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for WebhookDeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            queue_capacity: default_queue_capacity(),
            accept_invalid_certs: true,
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("Wagate/{}", env!("CARGO_PKG_VERSION"))
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}
