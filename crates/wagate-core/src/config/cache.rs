//! Per-tenant message cache configuration.

use serde::{Deserialize, Serialize};

/// Message cache configuration shared by every tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum messages retained per tenant after a cleanup pass (0 = unbounded).
    #[serde(default)]
    pub max_messages: u64,
    /// Length of the text preview attached to records that carry no text.
    #[serde(default = "default_synopsis_length")]
    pub synopsis_length: usize,
    /// When true, replacing a record with identical content does not
    /// re-trigger handler dispatch.
    #[serde(default = "default_true")]
    pub debounce_dispatch: bool,
    /// TTL for cached chat titles, in seconds.
    #[serde(default = "default_chat_title_ttl")]
    pub chat_title_ttl_seconds: u64,
    /// Maximum number of cached chat titles per tenant.
    #[serde(default = "default_chat_title_capacity")]
    pub chat_title_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_messages: 0,
            synopsis_length: default_synopsis_length(),
            debounce_dispatch: true,
            chat_title_ttl_seconds: default_chat_title_ttl(),
            chat_title_capacity: default_chat_title_capacity(),
        }
    }
}

fn default_synopsis_length() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_chat_title_ttl() -> u64 {
    600
}

fn default_chat_title_capacity() -> u64 {
    5000
}
