//! Tenant registry: every tenant runtime of the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wagate_core::error::AppError;
use wagate_core::result::AppResult;
use wagate_database::TenantRepository;
use wagate_entity::message::MessageRecord;
use wagate_entity::tenant::TenantConfig;
use wagate_entity::webhook::{WebhookConfig, WebhookOption};
use wagate_realtime::PushHub;
use wagate_worker::{DeliveryMetrics, DeliveryMetricsSnapshot};

use crate::dispatch::build_http_client;
use crate::protocol::ConnectionFactory;
use crate::send::SendRequest;
use crate::tenant::{GatewaySettings, RuntimeContext, TenantRuntime};

/// Owns the token -> runtime map.
///
/// The map lock is only held to look up or swap entries; all tenant work
/// happens on the runtime itself, so tenants never contend with each other.
#[derive(Debug)]
pub struct TenantRegistry {
    tenants: RwLock<HashMap<String, Arc<TenantRuntime>>>,
    factory: Arc<dyn ConnectionFactory>,
    ctx: RuntimeContext,
    shutdown: CancellationToken,
}

impl TenantRegistry {
    /// Create an empty registry.
    pub fn new(
        repository: Arc<dyn TenantRepository>,
        push: Arc<PushHub>,
        factory: Arc<dyn ConnectionFactory>,
        settings: GatewaySettings,
    ) -> AppResult<Self> {
        let client = build_http_client(&settings.webhook)?;
        Ok(Self {
            tenants: RwLock::new(HashMap::new()),
            factory,
            ctx: RuntimeContext {
                repository,
                push,
                client,
                settings: Arc::new(settings),
                metrics: Arc::new(DeliveryMetrics::new()),
            },
            shutdown: CancellationToken::new(),
        })
    }

    /// Load every stored tenant and start the ones allowed to auto-start.
    ///
    /// Returns the number of tenants loaded.
    pub async fn initialize(&self) -> AppResult<usize> {
        let configs = self.ctx.repository.find_all().await?;
        let total = configs.len();

        for config in configs {
            let runtime = self.load(config).await?;
            let status = runtime.status();
            if !status.is_valid_to_start() {
                info!(token = %runtime.token(), status = %status, "Tenant not started");
                continue;
            }
            if let Err(e) = runtime.start(self.factory.as_ref()).await {
                warn!(token = %runtime.token(), error = %e, "Tenant failed to start");
            }
        }

        info!(tenants = total, "Tenant registry initialized");
        Ok(total)
    }

    async fn load(&self, config: TenantConfig) -> AppResult<Arc<TenantRuntime>> {
        let webhooks = self.ctx.repository.find_webhooks(&config.token).await?;
        let runtime = TenantRuntime::new(config, self.ctx.clone(), &self.shutdown);
        runtime.attach_webhooks(webhooks);

        let previous = self
            .write()
            .insert(runtime.token().to_string(), runtime.clone());
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
        debug!(token = %runtime.token(), status = %runtime.status(), "Tenant loaded");
        Ok(runtime)
    }

    /// The runtime for `token`, or a not-found error.
    pub fn get(&self, token: &str) -> AppResult<Arc<TenantRuntime>> {
        self.find(token)
            .ok_or_else(|| AppError::not_found(format!("tenant '{token}' not found")))
    }

    pub fn find(&self, token: &str) -> Option<Arc<TenantRuntime>> {
        self.read().get(token).cloned()
    }

    pub fn exists(&self, token: &str) -> bool {
        self.read().contains_key(token)
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Loaded tokens, sorted.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Shared push hub.
    pub fn push(&self) -> &Arc<PushHub> {
        &self.ctx.push
    }

    /// Delivery counters across all tenants.
    pub fn metrics(&self) -> DeliveryMetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// Backend health probe.
    pub async fn repository_healthy(&self) -> bool {
        self.ctx.repository.health_check().await.unwrap_or(false)
    }

    /// Pair `token` with `wid`, creating the tenant when needed, and start it.
    pub async fn pair(&self, token: &str, wid: &str) -> AppResult<Arc<TenantRuntime>> {
        let token = token.trim();
        let wid = wid.trim();
        if token.is_empty() {
            return Err(AppError::validation("token is required"));
        }
        if wid.is_empty() {
            return Err(AppError::validation("wid is required"));
        }

        if let Some(owner) = self.ctx.repository.find_by_wid(wid).await? {
            if owner.token != token {
                return Err(AppError::conflict(format!(
                    "wid '{wid}' is already paired with another tenant"
                )));
            }
        }

        let runtime = match self.find(token) {
            Some(runtime) => runtime,
            None => {
                let config = match self.ctx.repository.find_by_token(token).await? {
                    Some(config) => config,
                    None => {
                        let config = TenantConfig::new(token);
                        self.ctx.repository.save(&config).await?;
                        config
                    }
                };
                self.load(config).await?
            }
        };

        runtime.pair(wid).await?;
        if let Err(e) = runtime.start(self.factory.as_ref()).await {
            warn!(token, error = %e, "Paired tenant failed to connect");
        }
        info!(token, wid, "Tenant paired");
        Ok(runtime)
    }

    /// Stop a tenant and delete it from storage. Returns whether it existed.
    pub async fn delete(&self, token: &str) -> AppResult<bool> {
        let removed = self.write().remove(token);
        if let Some(runtime) = &removed {
            runtime.logout().await;
        }
        let stored = self.ctx.repository.delete(token).await?;
        if removed.is_some() || stored {
            info!(token, "Tenant deleted");
        }
        Ok(removed.is_some() || stored)
    }

    /// Validate and send an outbound message for `token`.
    pub async fn send(&self, token: &str, request: SendRequest) -> AppResult<MessageRecord> {
        let runtime = self.get(token)?;
        let record = request.into_record()?;
        runtime.send(record).await
    }

    pub async fn add_webhook(&self, token: &str, webhook: WebhookConfig) -> AppResult<WebhookConfig> {
        self.get(token)?.add_or_update_webhook(webhook).await
    }

    pub async fn remove_webhook(&self, token: &str, url: &str) -> AppResult<bool> {
        self.get(token)?.remove_webhook(url).await
    }

    pub async fn toggle_webhook(&self, token: &str, url: &str, option: WebhookOption) -> AppResult<String> {
        self.get(token)?.toggle_webhook(url, option).await
    }

    /// Stop every tenant and close push connections.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let runtimes: Vec<Arc<TenantRuntime>> = self.write().drain().map(|(_, r)| r).collect();
        for runtime in &runtimes {
            runtime.shutdown().await;
        }
        self.ctx.push.close_all();
        info!(tenants = runtimes.len(), "Tenant registry shut down");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<TenantRuntime>>> {
        self.tenants.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<TenantRuntime>>> {
        self.tenants.write().unwrap_or_else(|e| e.into_inner())
    }
}
