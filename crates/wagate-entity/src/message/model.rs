//! Message record value objects.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GROUP_SUFFIX, MessageType, READ_RECEIPT_ID};

/// A conversation, or a participant inside one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chat {
    /// Network identifier (`<digits>@s.whatsapp.net`, `<id>@g.us`, ...).
    pub id: String,
    /// Display name, when known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl Chat {
    /// Create a chat reference with no title.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
        }
    }
}

/// Attachment metadata. The raw content never appears on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type.
    pub mime: String,
    /// Size in bytes.
    #[serde(rename = "filelength", default)]
    pub file_length: u64,
    /// Original file name.
    #[serde(rename = "filename", default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    /// Base64 JPEG thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Duration of audio/video, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    /// Latitude for location messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude for location messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Content bytes, if already downloaded or supplied by an outbound send.
    #[serde(skip)]
    pub content: Option<Bytes>,
    /// Whether the content can still be fetched from the network.
    #[serde(skip)]
    pub can_download: bool,
}

/// A normalized inbound or outbound message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Network message id. Compared case-insensitively.
    pub id: String,
    /// Correlation id supplied by the API client that sent this message.
    #[serde(rename = "trackid", default, skip_serializing_if = "String::is_empty")]
    pub track_id: String,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Classification.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Conversation the message belongs to.
    pub chat: Chat,
    /// Sender inside a group conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Chat>,
    /// Text body or caption.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Attachment metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Sent by the account owner.
    #[serde(rename = "fromme", default)]
    pub from_me: bool,
    /// Sent through this gateway's API.
    #[serde(rename = "frominternal", default)]
    pub from_internal: bool,
    /// The message was edited after sending.
    #[serde(default, skip_serializing_if = "is_false")]
    pub edited: bool,
    /// How many times the message was forwarded.
    #[serde(rename = "forwardingscore", default, skip_serializing_if = "is_zero")]
    pub forwarding_score: u32,
    /// Id of the message this one replies to.
    #[serde(rename = "inreply", default, skip_serializing_if = "String::is_empty")]
    pub in_reply: String,
    /// Truncated preview of the replied-to text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub synopsis: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl MessageRecord {
    /// Create a record with the given id, chat, type and timestamp.
    pub fn new(
        id: impl Into<String>,
        chat: Chat,
        message_type: MessageType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            chat,
            message_type,
            timestamp,
            ..Default::default()
        }
    }

    /// Normalize a message id for lookups.
    pub fn normalize_id(id: &str) -> String {
        id.to_uppercase()
    }

    /// The lookup key for this record.
    pub fn key(&self) -> String {
        Self::normalize_id(&self.id)
    }

    /// The chat is a group conversation.
    pub fn from_group(&self) -> bool {
        self.chat.id.ends_with(GROUP_SUFFIX)
    }

    /// The chat is a status update, broadcast list, or newsletter.
    pub fn from_broadcast(&self) -> bool {
        let id = self.chat.id.as_str();
        id == "status" || id.ends_with("@broadcast") || id.ends_with("@newsletter")
    }

    /// The record carries attachment metadata.
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// The record is the synthetic read receipt notice.
    pub fn is_read_receipt(&self) -> bool {
        self.message_type == MessageType::System && self.id == READ_RECEIPT_ID
    }

    /// The record is an incoming call.
    pub fn is_call(&self) -> bool {
        self.message_type == MessageType::Call
    }

    /// The record has a meaningful timestamp.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp > DateTime::<Utc>::UNIX_EPOCH
    }

    /// Structural equality of the normalized content.
    ///
    /// Two records are content-equal when type, text, edit flag and
    /// attachment mime/length all match. Routing fields and timestamps are
    /// ignored so that protocol replays of the same message compare equal.
    pub fn content_equals(&self, other: &Self) -> bool {
        let attachment_key =
            |r: &Self| r.attachment.as_ref().map(|a| (a.mime.clone(), a.file_length));

        self.message_type == other.message_type
            && self.text == other.text
            && self.edited == other.edited
            && attachment_key(self) == attachment_key(other)
    }
}
