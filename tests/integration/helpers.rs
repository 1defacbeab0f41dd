//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

use wagate_api::{AppState, build_app};
use wagate_core::config::AppConfig;
use wagate_database::InMemoryTenantRepository;
use wagate_realtime::PushHub;
use wagate_service::protocol::LoopbackConnection;
use wagate_service::{GatewaySettings, LoopbackFactory, TenantRegistry};

pub const WID: &str = "5511999990000@s.whatsapp.net";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Tenant registry behind the router
    pub registry: Arc<TenantRegistry>,
    /// Repository shared with the registry
    pub repository: Arc<InMemoryTenantRepository>,
    /// Factory holding every loopback connection
    pub factory: Arc<LoopbackFactory>,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub async fn new() -> Self {
        let config = AppConfig::default();
        let repository = Arc::new(InMemoryTenantRepository::new());
        let factory = Arc::new(LoopbackFactory::new());
        let push = Arc::new(PushHub::new(config.realtime.clone()));

        let registry = Arc::new(
            TenantRegistry::new(
                repository.clone(),
                push,
                factory.clone(),
                GatewaySettings::from_config(&config),
            )
            .expect("Failed to build registry"),
        );
        registry
            .initialize()
            .await
            .expect("Failed to initialize registry");

        let router = build_app(AppState::new(Arc::new(config), registry.clone()));
        Self {
            router,
            registry,
            repository,
            factory,
        }
    }

    /// Create an application with one paired, ready tenant
    pub async fn with_tenant(token: &str) -> Self {
        let app = Self::new().await;
        app.registry
            .pair(token, WID)
            .await
            .expect("Failed to pair tenant");
        app
    }

    /// The loopback connection of a started tenant
    pub fn connection(&self, token: &str) -> Arc<LoopbackConnection> {
        self.factory
            .connection(token)
            .expect("Tenant has no connection")
    }

    /// Make a request; `token` goes into the tenant token header
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("X-WAGATE-TOKEN", token);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Wait until `check` holds, polling briefly
    pub async fn eventually<F: Fn() -> bool>(&self, check: F) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Wait until a mock server has seen at least `count` requests
pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..200 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

/// Test response wrapper
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
