//! Effective per-tenant behavior.

use wagate_core::config::AppConfig;
use wagate_core::config::cache::CacheConfig;
use wagate_core::config::webhook::WebhookDeliveryConfig;
use wagate_core::config::whatsapp::WhatsappConfig;
use wagate_core::types::OptionBoolean;
use wagate_entity::tenant::TenantConfig;

/// Process-wide settings every tenant runtime is built from.
#[derive(Debug, Clone, Default)]
pub struct GatewaySettings {
    /// Message cache limits.
    pub cache: CacheConfig,
    /// Global messaging defaults.
    pub whatsapp: WhatsappConfig,
    /// Webhook delivery settings.
    pub webhook: WebhookDeliveryConfig,
}

impl GatewaySettings {
    /// Extract the tenant-relevant sections of the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache: config.cache.clone(),
            whatsapp: config.whatsapp.clone(),
            webhook: config.webhook.clone(),
        }
    }
}

/// Resolved options for one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantOptions {
    pub groups: bool,
    pub broadcasts: bool,
    pub read_receipts: bool,
    pub calls: bool,
    pub read_update: bool,
    pub history_sync: bool,
}

impl TenantOptions {
    /// Combine global defaults with a tenant's own settings.
    pub fn resolve(global: &WhatsappConfig, tenant: &TenantConfig) -> Self {
        Self {
            groups: OptionBoolean::resolve(global.groups, tenant.groups),
            broadcasts: OptionBoolean::resolve(global.broadcasts, tenant.broadcasts),
            read_receipts: OptionBoolean::resolve(global.read_receipts, tenant.read_receipts),
            calls: OptionBoolean::resolve(global.calls, tenant.calls),
            read_update: OptionBoolean::resolve(global.read_update.into(), tenant.read_update),
            history_sync: global.history_sync,
        }
    }
}
