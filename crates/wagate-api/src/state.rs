//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use wagate_core::config::AppConfig;
use wagate_realtime::PushHub;
use wagate_service::TenantRegistry;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Every tenant runtime of the process
    pub registry: Arc<TenantRegistry>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Creates the state, starting the uptime clock.
    pub fn new(config: Arc<AppConfig>, registry: Arc<TenantRegistry>) -> Self {
        Self {
            config,
            registry,
            started_at: Instant::now(),
        }
    }

    /// Push hub shared with the tenant runtimes.
    pub fn push(&self) -> &Arc<PushHub> {
        self.registry.push()
    }
}
