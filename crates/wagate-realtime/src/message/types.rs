//! Inbound and outbound push frame definitions.

use serde::{Deserialize, Serialize};

use wagate_entity::message::MessageRecord;

/// Frames sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    /// Bind this connection to a tenant token.
    Bind {
        /// Tenant token.
        token: String,
    },
}

/// Named-event frame pushed to clients: `{"target": ..., "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    /// Event name.
    pub target: String,
    /// Event arguments.
    pub args: Vec<serde_json::Value>,
}

impl PushFrame {
    /// A new-message frame carrying one record.
    pub fn message(target: &str, record: &MessageRecord) -> Result<Self, serde_json::Error> {
        Ok(Self {
            target: target.to_string(),
            args: vec![serde_json::to_value(record)?],
        })
    }

    /// Acknowledges a token binding.
    pub fn bound(token: &str) -> Self {
        Self {
            target: "bound".to_string(),
            args: vec![serde_json::Value::String(token.to_string())],
        }
    }

    /// Reports a client error.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            target: "error".to_string(),
            args: vec![
                serde_json::Value::String(code.to_string()),
                serde_json::Value::String(message.into()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wagate_entity::message::{Chat, MessageType};

    #[test]
    fn test_message_frame_shape() {
        let record = MessageRecord::new("MSG1", Chat::new("1@s.whatsapp.net"), MessageType::Text, Utc::now());
        let frame = PushFrame::message("message", &record).unwrap();
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["target"], "message");
        assert_eq!(json["args"][0]["id"], "MSG1");
    }

    #[test]
    fn test_parse_bind() {
        let msg: InboundMessage = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        let InboundMessage::Bind { token } = msg;
        assert_eq!(token, "abc");
    }
}
