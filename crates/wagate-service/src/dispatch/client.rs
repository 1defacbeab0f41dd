//! Shared HTTP client for webhook delivery.

use std::time::Duration;

use wagate_core::config::webhook::WebhookDeliveryConfig;
use wagate_core::error::{AppError, ErrorKind};
use wagate_core::result::AppResult;

/// Build the client every webhook dispatcher of the process shares.
pub fn build_http_client(config: &WebhookDeliveryConfig) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
        .user_agent(config.user_agent.clone())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                "Failed to build webhook HTTP client",
                e,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_defaults() {
        assert!(build_http_client(&WebhookDeliveryConfig::default()).is_ok());
    }
}
