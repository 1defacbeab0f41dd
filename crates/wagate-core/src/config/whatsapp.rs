//! Global messaging defaults.
//!
//! Each option is tri-state. A per-tenant value may refine an unforced
//! global default, while a forced global value always wins.

use serde::{Deserialize, Serialize};

use crate::types::OptionBoolean;

/// Global defaults for what each tenant ingests and how it behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappConfig {
    /// Ingest group chat messages.
    #[serde(default = "default_true_option")]
    pub groups: OptionBoolean,
    /// Ingest status and broadcast messages.
    #[serde(default = "default_false_option")]
    pub broadcasts: OptionBoolean,
    /// Surface read receipts as synthetic system records.
    #[serde(default = "default_false_option")]
    pub read_receipts: OptionBoolean,
    /// Surface incoming calls. When not handled, calls are rejected.
    #[serde(default = "default_true_option")]
    pub calls: OptionBoolean,
    /// Mark incoming messages as read once they have been dispatched.
    #[serde(default)]
    pub read_update: bool,
    /// Ingest history sync batches delivered after pairing.
    #[serde(default)]
    pub history_sync: bool,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            groups: default_true_option(),
            broadcasts: default_false_option(),
            read_receipts: default_false_option(),
            calls: default_true_option(),
            read_update: false,
            history_sync: false,
        }
    }
}

fn default_true_option() -> OptionBoolean {
    OptionBoolean::True
}

fn default_false_option() -> OptionBoolean {
    OptionBoolean::False
}
