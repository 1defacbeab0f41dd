//! Webhook dispatcher. Posts records to one external URL.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use wagate_entity::message::MessageRecord;
use wagate_entity::webhook::WebhookConfig;
use wagate_worker::{Delivery, EventSubscriber, SubscriberError};

use super::filter::skip_reason;

/// Header carrying the tenant's network identity.
pub const WID_HEADER: &str = "X-WAGATE-WID";

/// The tenant's current network identity, shared with its dispatchers.
pub type SharedWid = Arc<RwLock<Option<String>>>;

/// Why a POST did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The endpoint did not answer in time.
    #[error("request timed out")]
    Timeout,
    /// Connection, TLS or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with something other than 200.
    #[error("unexpected status {0}")]
    Status(u16),
    /// The payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<DeliveryError> for SubscriberError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Serialization(_) => SubscriberError::Permanent(err.to_string()),
            other => SubscriberError::Transient(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    message: &'a MessageRecord,
    extra: &'a Option<serde_json::Value>,
}

/// Delivers records to one webhook subscription.
#[derive(Debug)]
pub struct WebhookDispatcher {
    id: String,
    config: RwLock<WebhookConfig>,
    client: reqwest::Client,
    wid: SharedWid,
}

impl WebhookDispatcher {
    /// Create a dispatcher for `config`.
    pub fn new(config: WebhookConfig, client: reqwest::Client, wid: SharedWid) -> Self {
        Self {
            id: format!("webhook:{}", config.url),
            config: RwLock::new(config),
            client,
            wid,
        }
    }

    /// Destination URL.
    pub fn url(&self) -> String {
        self.read().url.clone()
    }

    /// Current settings and delivery state.
    pub fn config(&self) -> WebhookConfig {
        self.read().clone()
    }

    /// Replace the filter settings, keeping delivery timestamps.
    pub fn update(&self, settings: &WebhookConfig) {
        self.write().apply_settings(settings);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, WebhookConfig> {
        self.config.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, WebhookConfig> {
        self.config.write().unwrap_or_else(|e| e.into_inner())
    }

    fn current_wid(&self) -> String {
        self.wid
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_default()
    }

    async fn post(&self, config: &WebhookConfig, record: &MessageRecord) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(&WebhookPayload {
            message: record,
            extra: &config.extra,
        })
        .map_err(|e| DeliveryError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&config.url)
            .header(CONTENT_TYPE, "application/json")
            .header(WID_HEADER, self.current_wid())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(())
    }

    fn record_failure(&self) {
        let mut config = self.write();
        if config.failure.is_none() {
            config.failure = Some(Utc::now());
        }
    }

    fn record_success(&self) {
        let mut config = self.write();
        config.failure = None;
        config.success = Some(Utc::now());
    }
}

#[async_trait]
impl EventSubscriber for WebhookDispatcher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn deliver(&self, record: Arc<MessageRecord>) -> Result<Delivery, SubscriberError> {
        let config = self.config();

        if let Some(reason) = skip_reason(&config, &record) {
            debug!(url = %config.url, msg_id = %record.id, reason = %reason, "Webhook skipped record");
            return Ok(Delivery::Skipped);
        }

        match self.post(&config, &record).await {
            Ok(()) => {
                self.record_success();
                debug!(url = %config.url, msg_id = %record.id, "Webhook delivered");
                Ok(Delivery::Sent)
            }
            Err(e) => {
                self.record_failure();
                warn!(url = %config.url, msg_id = %record.id, error = %e, "Webhook delivery failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wagate_core::config::webhook::WebhookDeliveryConfig;
    use wagate_entity::message::{Chat, MessageType};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::dispatch::client::build_http_client;

    fn dispatcher(url: String) -> WebhookDispatcher {
        let client = build_http_client(&WebhookDeliveryConfig::default()).unwrap();
        let wid = Arc::new(RwLock::new(Some("5511999@s.whatsapp.net".to_string())));
        WebhookDispatcher::new(WebhookConfig::new("tok", url), client, wid)
    }

    fn text(id: &str, chat: &str, body: &str) -> Arc<MessageRecord> {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut record = MessageRecord::new(id, Chat::new(chat), MessageType::Text, ts);
        record.text = body.to_string();
        Arc::new(record)
    }

    #[tokio::test]
    async fn test_disabled_groups_make_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let hook = dispatcher(format!("{}/hook", server.uri()));
        let mut settings = hook.config();
        settings.groups = Some(false);
        hook.update(&settings);

        let outcome = hook.deliver(text("G1", "1203630@g.us", "hi")).await.unwrap();
        assert_eq!(outcome, Delivery::Skipped);
    }

    #[tokio::test]
    async fn test_unset_groups_deliver_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = dispatcher(format!("{}/hook", server.uri()));
        let outcome = hook.deliver(text("G1", "1203630@g.us", "hi")).await.unwrap();
        assert_eq!(outcome, Delivery::Sent);
    }

    #[tokio::test]
    async fn test_failure_timestamp_is_kept_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let hook = dispatcher(format!("{}/hook", server.uri()));
        let msg = text("M1", "5511@s.whatsapp.net", "hi");

        assert!(hook.deliver(msg.clone()).await.is_err());
        let first = hook.config().failure.expect("failure recorded");

        assert!(hook.deliver(msg.clone()).await.is_err());
        assert_eq!(hook.config().failure, Some(first));
        assert!(hook.config().success.is_none());

        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(hook.deliver(msg).await.unwrap(), Delivery::Sent);
        let state = hook.config();
        assert!(state.failure.is_none());
        assert!(state.success.is_some());
    }

    #[tokio::test]
    async fn test_non_200_success_codes_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let hook = dispatcher(format!("{}/hook", server.uri()));
        let err = hook
            .deliver(text("M1", "5511@s.whatsapp.net", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriberError::Transient(_)));
    }

    #[tokio::test]
    async fn test_payload_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header(WID_HEADER, "5511999@s.whatsapp.net"))
            .and(header("content-type", "application/json"))
            .and(header(
                "user-agent",
                WebhookDeliveryConfig::default().user_agent.as_str(),
            ))
            .and(body_partial_json(json!({
                "message": {"id": "MSG1", "text": "hi", "type": "text", "fromme": false},
                "extra": {"crm": 7}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = dispatcher(format!("{}/hook", server.uri()));
        let mut settings = hook.config();
        settings.extra = Some(json!({"crm": 7}));
        hook.update(&settings);

        let outcome = hook
            .deliver(text("MSG1", "123@s.whatsapp.net", "hi"))
            .await
            .unwrap();
        assert_eq!(outcome, Delivery::Sent);
    }
}
