//! Tenant repository contract and implementations.

pub mod memory;
pub mod tenant;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use wagate_core::config::database::DatabaseConfig;
use wagate_core::error::AppError;
use wagate_core::result::AppResult;
use wagate_entity::tenant::TenantConfig;
use wagate_entity::webhook::WebhookConfig;

use crate::connection::DatabasePool;
use crate::migration::run_migrations;

pub use memory::InMemoryTenantRepository;
pub use tenant::PgTenantRepository;

/// Persistence for tenant configs and their webhook subscriptions.
#[async_trait]
pub trait TenantRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a tenant by its token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<TenantConfig>>;

    /// Find the tenant paired with a wid.
    async fn find_by_wid(&self, wid: &str) -> AppResult<Option<TenantConfig>>;

    /// List every tenant.
    async fn find_all(&self) -> AppResult<Vec<TenantConfig>>;

    /// Whether a tenant with this token exists.
    async fn exists(&self, token: &str) -> AppResult<bool>;

    /// Insert or update a tenant.
    async fn save(&self, config: &TenantConfig) -> AppResult<()>;

    /// Delete a tenant and its webhooks. Returns `true` if it existed.
    async fn delete(&self, token: &str) -> AppResult<bool>;

    /// List the webhooks of a tenant.
    async fn find_webhooks(&self, token: &str) -> AppResult<Vec<WebhookConfig>>;

    /// Insert or update a webhook keyed by (token, url). Returns affected rows.
    async fn add_or_update_webhook(&self, webhook: &WebhookConfig) -> AppResult<u64>;

    /// Remove one webhook. Returns affected rows.
    async fn remove_webhook(&self, token: &str, url: &str) -> AppResult<u64>;

    /// Backend health probe.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Build the repository selected by `config.provider`.
pub async fn open_repository(config: &DatabaseConfig) -> AppResult<Arc<dyn TenantRepository>> {
    match config.provider.as_str() {
        "memory" => {
            info!("Using in-memory tenant repository");
            Ok(Arc::new(InMemoryTenantRepository::new()))
        }
        "postgres" => {
            let db = DatabasePool::connect(config).await?;
            if config.run_migrations {
                run_migrations(db.pool()).await?;
            }
            Ok(Arc::new(PgTenantRepository::new(db)))
        }
        other => Err(AppError::configuration(format!(
            "Unknown database provider: {other}"
        ))),
    }
}
