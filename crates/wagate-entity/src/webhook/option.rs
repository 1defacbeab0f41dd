//! Toggleable webhook options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wagate_core::AppError;

/// A per-subscription option that can be toggled through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookOption {
    /// Group messages filter.
    Groups,
    /// Broadcast/newsletter filter.
    Broadcasts,
    /// Read receipt filter.
    #[serde(alias = "read_receipts")]
    ReadReceipts,
    /// Call filter.
    Calls,
    /// Forward messages sent through this gateway.
    #[serde(alias = "forward_internal")]
    ForwardInternal,
}

impl WebhookOption {
    /// Return the option as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Broadcasts => "broadcasts",
            Self::ReadReceipts => "readreceipts",
            Self::Calls => "calls",
            Self::ForwardInternal => "forwardinternal",
        }
    }
}

impl fmt::Display for WebhookOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WebhookOption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "groups" => Ok(Self::Groups),
            "broadcasts" => Ok(Self::Broadcasts),
            "readreceipts" => Ok(Self::ReadReceipts),
            "calls" => Ok(Self::Calls),
            "forwardinternal" => Ok(Self::ForwardInternal),
            other => Err(AppError::validation(format!("Unknown webhook option: {other}"))),
        }
    }
}
