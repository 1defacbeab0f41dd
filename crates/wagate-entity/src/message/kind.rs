//! Message classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a normalized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text.
    Text,
    /// Image attachment.
    Image,
    /// Audio or voice note.
    Audio,
    /// Video attachment.
    Video,
    /// Any other file.
    Document,
    /// Shared location.
    Location,
    /// Shared contact card.
    Contact,
    /// Incoming call offer.
    Call,
    /// A revoked (deleted for everyone) message.
    Revoke,
    /// Synthetic gateway or network notice.
    System,
    /// Protocol noise that should never reach subscribers.
    Discard,
    /// Could not be classified.
    #[default]
    Unknown,
}

impl MessageType {
    /// Whether records of this type are worth delivering to webhooks.
    pub fn is_deliverable(&self) -> bool {
        !matches!(self, Self::Discard | Self::Unknown)
    }

    /// Whether this type normally carries media content.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Audio | Self::Video | Self::Document)
    }

    /// Infer the media type from a MIME string.
    pub fn from_mime(mime: &str) -> Self {
        let base = mime.split(';').next().unwrap_or_default().trim();
        match base.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            _ => Self::Document,
        }
    }

    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Location => "location",
            Self::Contact => "contact",
            Self::Call => "call",
            Self::Revoke => "revoke",
            Self::System => "system",
            Self::Discard => "discard",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
