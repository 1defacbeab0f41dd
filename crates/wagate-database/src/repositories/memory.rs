//! In-memory tenant repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use wagate_core::result::AppResult;
use wagate_entity::tenant::TenantConfig;
use wagate_entity::webhook::WebhookConfig;

use super::TenantRepository;

/// Process-local tenant store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryTenantRepository {
    tenants: DashMap<String, TenantConfig>,
    webhooks: DashMap<String, Vec<WebhookConfig>>,
}

impl InMemoryTenantRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_token(&self, token: &str) -> AppResult<Option<TenantConfig>> {
        Ok(self.tenants.get(token).map(|entry| entry.value().clone()))
    }

    async fn find_by_wid(&self, wid: &str) -> AppResult<Option<TenantConfig>> {
        Ok(self
            .tenants
            .iter()
            .find(|entry| entry.value().wid() == Some(wid))
            .map(|entry| entry.value().clone()))
    }

    async fn find_all(&self) -> AppResult<Vec<TenantConfig>> {
        let mut all: Vec<TenantConfig> =
            self.tenants.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn exists(&self, token: &str) -> AppResult<bool> {
        Ok(self.tenants.contains_key(token))
    }

    async fn save(&self, config: &TenantConfig) -> AppResult<()> {
        let mut stored = config.clone();
        stored.updated_at = Utc::now();
        self.tenants.insert(stored.token.clone(), stored);
        Ok(())
    }

    async fn delete(&self, token: &str) -> AppResult<bool> {
        self.webhooks.remove(token);
        Ok(self.tenants.remove(token).is_some())
    }

    async fn find_webhooks(&self, token: &str) -> AppResult<Vec<WebhookConfig>> {
        Ok(self
            .webhooks
            .get(token)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn add_or_update_webhook(&self, webhook: &WebhookConfig) -> AppResult<u64> {
        let mut entry = self.webhooks.entry(webhook.token.clone()).or_default();
        match entry.iter_mut().find(|w| w.url == webhook.url) {
            Some(existing) => existing.apply_settings(webhook),
            None => entry.push(webhook.clone()),
        }
        Ok(1)
    }

    async fn remove_webhook(&self, token: &str, url: &str) -> AppResult<u64> {
        let Some(mut entry) = self.webhooks.get_mut(token) else {
            return Ok(0);
        };
        let before = entry.len();
        entry.retain(|w| w.url != url);
        Ok((before - entry.len()) as u64)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
