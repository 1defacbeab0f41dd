//! Real-time push hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) push configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound buffer per connection. A full buffer drops the frame.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Target name used for pushed message frames.
    #[serde(default = "default_target")]
    pub message_target: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            message_target: default_target(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_target() -> String {
    "message".to_string()
}
