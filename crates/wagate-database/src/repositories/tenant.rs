//! PostgreSQL tenant repository.

use async_trait::async_trait;

use wagate_core::error::{AppError, ErrorKind};
use wagate_core::result::AppResult;
use wagate_entity::tenant::TenantConfig;
use wagate_entity::webhook::WebhookConfig;

use super::TenantRepository;
use crate::connection::DatabasePool;

/// Repository for the `servers` and `webhooks` tables.
#[derive(Debug, Clone)]
pub struct PgTenantRepository {
    db: DatabasePool,
}

impl PgTenantRepository {
    /// Create a new tenant repository.
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_token(&self, token: &str) -> AppResult<Option<TenantConfig>> {
        sqlx::query_as::<_, TenantConfig>("SELECT * FROM servers WHERE token = $1")
            .bind(token)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find server", e))
    }

    async fn find_by_wid(&self, wid: &str) -> AppResult<Option<TenantConfig>> {
        sqlx::query_as::<_, TenantConfig>("SELECT * FROM servers WHERE wid = $1")
            .bind(wid)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find server by wid", e)
            })
    }

    async fn find_all(&self) -> AppResult<Vec<TenantConfig>> {
        sqlx::query_as::<_, TenantConfig>("SELECT * FROM servers ORDER BY created_at ASC")
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list servers", e))
    }

    async fn exists(&self, token: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM servers WHERE token = $1)")
            .bind(token)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check server exists", e)
            })
    }

    async fn save(&self, config: &TenantConfig) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO servers (token, wid, verified, devel, groups, broadcasts, read_receipts, calls, read_update, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
             ON CONFLICT (token) DO UPDATE SET \
             wid = EXCLUDED.wid, verified = EXCLUDED.verified, devel = EXCLUDED.devel, \
             groups = EXCLUDED.groups, broadcasts = EXCLUDED.broadcasts, \
             read_receipts = EXCLUDED.read_receipts, calls = EXCLUDED.calls, \
             read_update = EXCLUDED.read_update, updated_at = NOW()",
        )
        .bind(&config.token)
        .bind(config.wid())
        .bind(config.verified)
        .bind(config.devel)
        .bind(config.groups.to_i16())
        .bind(config.broadcasts.to_i16())
        .bind(config.read_receipts.to_i16())
        .bind(config.calls.to_i16())
        .bind(config.read_update.to_i16())
        .bind(config.created_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save server", e))?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM servers WHERE token = $1")
            .bind(token)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete server", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_webhooks(&self, token: &str) -> AppResult<Vec<WebhookConfig>> {
        sqlx::query_as::<_, WebhookConfig>(
            "SELECT token, url, forward_internal, track_id, extra, groups, broadcasts, read_receipts, calls \
             FROM webhooks WHERE token = $1 ORDER BY url ASC",
        )
        .bind(token)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list webhooks", e))
    }

    async fn add_or_update_webhook(&self, webhook: &WebhookConfig) -> AppResult<u64> {
        let result = sqlx::query(
            "INSERT INTO webhooks (token, url, forward_internal, track_id, extra, groups, broadcasts, read_receipts, calls) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (token, url) DO UPDATE SET \
             forward_internal = EXCLUDED.forward_internal, track_id = EXCLUDED.track_id, \
             extra = EXCLUDED.extra, groups = EXCLUDED.groups, broadcasts = EXCLUDED.broadcasts, \
             read_receipts = EXCLUDED.read_receipts, calls = EXCLUDED.calls",
        )
        .bind(&webhook.token)
        .bind(&webhook.url)
        .bind(webhook.forward_internal)
        .bind(&webhook.track_id)
        .bind(&webhook.extra)
        .bind(webhook.groups)
        .bind(webhook.broadcasts)
        .bind(webhook.read_receipts)
        .bind(webhook.calls)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save webhook", e))?;
        Ok(result.rows_affected())
    }

    async fn remove_webhook(&self, token: &str, url: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM webhooks WHERE token = $1 AND url = $2")
            .bind(token)
            .bind(url)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove webhook", e))?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
