//! Webhook subscription model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::WebhookOption;

/// An external URL receiving a tenant's records, with delivery filters.
///
/// Filter fields are tri-state: `None` defers to the tenant default,
/// `Some(false)` skips the matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WebhookConfig {
    /// Owning tenant token.
    #[serde(default, skip_serializing)]
    pub token: String,
    /// Destination URL.
    pub url: String,
    /// Forward records sent through this gateway's API.
    #[serde(rename = "forwardinternal", default)]
    pub forward_internal: bool,
    /// Loop-prevention token of the system behind this URL.
    #[serde(rename = "trackid", default, skip_serializing_if = "String::is_empty")]
    pub track_id: String,
    /// Opaque payload echoed with every delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
    /// Group messages filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<bool>,
    /// Broadcast filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcasts: Option<bool>,
    /// Read receipt filter.
    #[serde(rename = "readreceipts", default, skip_serializing_if = "Option::is_none")]
    pub read_receipts: Option<bool>,
    /// Call filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calls: Option<bool>,
    /// Start of the current delivery outage.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<DateTime<Utc>>,
    /// Last successful delivery.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<DateTime<Utc>>,
}

impl WebhookConfig {
    /// A subscription with all filters unset.
    pub fn new(token: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: url.into(),
            forward_internal: false,
            track_id: String::new(),
            extra: None,
            groups: None,
            broadcasts: None,
            read_receipts: None,
            calls: None,
            failure: None,
            success: None,
        }
    }

    /// Advance the named option and return its new display value.
    ///
    /// Tri-state filters cycle unset -> true -> false -> unset;
    /// `forward_internal` flips.
    pub fn toggle(&mut self, option: WebhookOption) -> String {
        let slot = match option {
            WebhookOption::Groups => &mut self.groups,
            WebhookOption::Broadcasts => &mut self.broadcasts,
            WebhookOption::ReadReceipts => &mut self.read_receipts,
            WebhookOption::Calls => &mut self.calls,
            WebhookOption::ForwardInternal => {
                self.forward_internal = !self.forward_internal;
                return self.forward_internal.to_string();
            }
        };

        *slot = match *slot {
            None => Some(true),
            Some(true) => Some(false),
            Some(false) => None,
        };
        slot.map(|v| v.to_string()).unwrap_or_default()
    }

    /// Copy the user-editable settings from `other`, keeping delivery state.
    pub fn apply_settings(&mut self, other: &Self) {
        self.forward_internal = other.forward_internal;
        self.track_id = other.track_id.clone();
        self.extra = other.extra.clone();
        self.groups = other.groups;
        self.broadcasts = other.broadcasts;
        self.read_receipts = other.read_receipts;
        self.calls = other.calls;
    }
}
