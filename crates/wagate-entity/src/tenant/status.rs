//! Tenant lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a tenant runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// No protocol session exists yet.
    Unprepared,
    /// A pairing code was issued and awaits confirmation.
    Pairing,
    /// Session active, ingesting and sending.
    Ready,
    /// Network dropped; reconnect expected.
    Disconnected,
    /// Session credentials invalidated. Requires re-pairing.
    LoggedOut,
}

impl TenantStatus {
    /// States that are started automatically at process start.
    pub fn is_valid_to_start(&self) -> bool {
        matches!(self, Self::Unprepared | Self::Disconnected | Self::Ready)
    }

    /// Whether outbound operations may be submitted.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether `self -> next` is an allowed lifecycle transition.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use TenantStatus::*;
        match (self, next) {
            (Unprepared | LoggedOut, Pairing | Ready) => true,
            (Pairing, Ready | Unprepared) => true,
            (Ready, Disconnected | LoggedOut) => true,
            (Disconnected, Ready | LoggedOut) => true,
            (current, next) => *current == next,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unprepared => "unprepared",
            Self::Pairing => "pairing",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::LoggedOut => "loggedout",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
