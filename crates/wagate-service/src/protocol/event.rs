//! Normalized protocol events.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use wagate_entity::message::{Chat, MessageRecord};

/// Channel a connection uses to hand events to its tenant runtime.
pub type EventSender = mpsc::UnboundedSender<ProtocolEvent>;

/// Everything a protocol connection can report.
#[derive(Debug, Clone)]
pub enum ProtocolEvent {
    /// A message was received or sent from another device.
    NewMessage(MessageRecord),
    /// Messages in a chat were read by the recipient.
    DeliveryReceipt {
        /// Conversation the receipt belongs to.
        chat: Chat,
        /// Ids of the messages that were read.
        ids: Vec<String>,
        /// When the receipt was emitted.
        timestamp: DateTime<Utc>,
    },
    /// Someone is calling the account.
    CallOffer {
        /// Network call id.
        id: String,
        /// Caller.
        from: Chat,
        /// When the call started.
        timestamp: DateTime<Utc>,
    },
    /// The session is up.
    Connected {
        /// Session identity reported by the network.
        wid: String,
    },
    /// The network dropped; the client is reconnecting.
    Disconnected {
        /// Human readable cause.
        reason: String,
    },
    /// The session was invalidated and must be paired again.
    LoggedOut {
        /// Human readable cause.
        reason: String,
    },
    /// Past messages delivered after pairing, in any order.
    HistoryBatch(Vec<MessageRecord>),
}

impl ProtocolEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::DeliveryReceipt { .. } => "delivery_receipt",
            Self::CallOffer { .. } => "call_offer",
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::LoggedOut { .. } => "logged_out",
            Self::HistoryBatch(_) => "history_batch",
        }
    }
}
