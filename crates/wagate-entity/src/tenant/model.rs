//! Persisted tenant configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wagate_core::types::OptionBoolean;

use super::TenantStatus;

/// One managed messaging account, as stored in the `servers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantConfig {
    /// Public API token.
    pub token: String,
    /// Protocol-level identity, empty until paired.
    pub wid: Option<String>,
    /// The session credentials are known to be valid.
    pub verified: bool,
    /// Verbose logging for this tenant.
    pub devel: bool,
    /// Ingest group messages.
    #[sqlx(try_from = "i16")]
    pub groups: OptionBoolean,
    /// Ingest broadcast and status messages.
    #[sqlx(try_from = "i16")]
    pub broadcasts: OptionBoolean,
    /// Surface read receipts.
    #[sqlx(try_from = "i16")]
    pub read_receipts: OptionBoolean,
    /// Surface calls.
    #[sqlx(try_from = "i16")]
    pub calls: OptionBoolean,
    /// Mark dispatched messages as read.
    #[sqlx(try_from = "i16")]
    pub read_update: OptionBoolean,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TenantConfig {
    /// A fresh, unpaired tenant.
    pub fn new(token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            wid: None,
            verified: false,
            devel: false,
            groups: OptionBoolean::Unset,
            broadcasts: OptionBoolean::Unset,
            read_receipts: OptionBoolean::Unset,
            calls: OptionBoolean::Unset,
            read_update: OptionBoolean::Unset,
            created_at: now,
            updated_at: now,
        }
    }

    /// The paired wid, if any.
    pub fn wid(&self) -> Option<&str> {
        self.wid.as_deref().filter(|w| !w.is_empty())
    }

    /// The lifecycle state a runtime starts in for this config.
    ///
    /// A tenant that was paired but lost verification is logged out;
    /// a never-paired tenant is unprepared; a verified tenant is treated
    /// as disconnected until its connection comes up.
    pub fn initial_status(&self) -> TenantStatus {
        match (self.wid(), self.verified) {
            (None, _) => TenantStatus::Unprepared,
            (Some(_), false) => TenantStatus::LoggedOut,
            (Some(_), true) => TenantStatus::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        let mut config = TenantConfig::new("tok");
        assert_eq!(config.initial_status(), TenantStatus::Unprepared);

        config.wid = Some("5511999@s.whatsapp.net".to_string());
        assert_eq!(config.initial_status(), TenantStatus::LoggedOut);

        config.verified = true;
        assert_eq!(config.initial_status(), TenantStatus::Disconnected);
    }

    #[test]
    fn test_empty_wid_counts_as_unpaired() {
        let mut config = TenantConfig::new("tok");
        config.wid = Some(String::new());
        config.verified = true;
        assert_eq!(config.wid(), None);
        assert_eq!(config.initial_status(), TenantStatus::Unprepared);
    }
}
