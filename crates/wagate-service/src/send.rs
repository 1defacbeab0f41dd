//! Outbound send requests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use wagate_core::error::AppError;
use wagate_core::result::AppResult;
use wagate_entity::message::{Attachment, Chat, GROUP_SUFFIX, MessageRecord, MessageType, USER_SUFFIX};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Body of a send request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SendRequest {
    /// Optional client-chosen message id.
    #[serde(default)]
    #[validate(length(max = 128))]
    pub id: String,
    /// Recipient chat.
    #[serde(rename = "chatid", alias = "chatId", default)]
    #[validate(length(min = 1, message = "chat id missing"))]
    pub chat_id: String,
    /// Correlation id echoed back on the record.
    #[serde(rename = "trackid", alias = "trackId", default)]
    #[validate(length(max = 128))]
    pub track_id: String,
    /// Text body, or caption when an attachment is present.
    #[serde(default)]
    pub text: String,
    /// Id of the message being replied to.
    #[serde(rename = "inreply", alias = "inReply", default)]
    pub in_reply: String,
    /// Attachment file name.
    #[serde(rename = "filename", alias = "fileName", default)]
    pub file_name: String,
    /// Attachment MIME type.
    #[serde(default)]
    pub mime: String,
    /// Base64 attachment content.
    #[serde(default)]
    pub content: String,
}

/// Reply to a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: String,
    #[serde(rename = "trackid", default, skip_serializing_if = "String::is_empty")]
    pub track_id: String,
    #[serde(rename = "chatid")]
    pub chat_id: String,
}

impl From<&MessageRecord> for SendResponse {
    fn from(record: &MessageRecord) -> Self {
        Self {
            id: record.id.clone(),
            track_id: record.track_id.clone(),
            chat_id: record.chat.id.clone(),
        }
    }
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// Complete a bare recipient into a network chat id.
///
/// Bare phone numbers become user chats and `creator-timestamp` ids
/// become group chats. Ids that already carry a server are kept.
pub fn normalize_chat_id(raw: &str) -> AppResult<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::validation("chat id missing"));
    }
    if id.contains('@') {
        return Ok(id.to_string());
    }

    let id = id.trim_start_matches('+');
    if id.contains('-') && id.split('-').all(is_digits) {
        return Ok(format!("{id}{GROUP_SUFFIX}"));
    }
    if is_digits(id) {
        return Ok(format!("{id}{USER_SUFFIX}"));
    }
    Err(AppError::validation(format!("malformed chat id: '{raw}'")))
}

impl SendRequest {
    /// Validate the request and build the record handed to the connection.
    pub fn into_record(self) -> AppResult<MessageRecord> {
        self.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        let chat_id = normalize_chat_id(&self.chat_id)?;

        let attachment = if self.content.trim().is_empty() {
            None
        } else {
            let content = STANDARD
                .decode(self.content.trim())
                .map_err(|e| AppError::validation(format!("invalid attachment content: {e}")))?;
            let mime = if self.mime.trim().is_empty() {
                DEFAULT_MIME.to_string()
            } else {
                self.mime.trim().to_string()
            };
            Some(Attachment {
                mime,
                file_length: content.len() as u64,
                file_name: self.file_name.clone(),
                content: Some(Bytes::from(content)),
                ..Default::default()
            })
        };

        let message_type = match &attachment {
            Some(attachment) => MessageType::from_mime(&attachment.mime),
            None if self.text.trim().is_empty() => {
                return Err(AppError::validation("text or attachment required"));
            }
            None => MessageType::Text,
        };

        let mut record = MessageRecord::new(self.id, Chat::new(chat_id), message_type, Utc::now());
        record.track_id = self.track_id;
        record.text = self.text;
        record.in_reply = self.in_reply;
        record.attachment = attachment;
        record.from_me = true;
        record.from_internal = true;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::error::ErrorKind;

    fn request(chat: &str, text: &str) -> SendRequest {
        SendRequest {
            chat_id: chat.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chat_id_normalization() {
        assert_eq!(normalize_chat_id("5511999").unwrap(), "5511999@s.whatsapp.net");
        assert_eq!(normalize_chat_id("+5511999").unwrap(), "5511999@s.whatsapp.net");
        assert_eq!(normalize_chat_id("5511999-1603").unwrap(), "5511999-1603@g.us");
        assert_eq!(normalize_chat_id("120363@g.us").unwrap(), "120363@g.us");
        assert!(normalize_chat_id("  ").is_err());
        assert!(normalize_chat_id("alice").is_err());
        assert!(normalize_chat_id("5511999-").is_err());
    }

    #[test]
    fn test_missing_chat_is_rejected() {
        let err = request("", "hi").into_record().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_empty_text_without_attachment_is_rejected() {
        let err = request("5511", "  ").into_record().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_text_record() {
        let mut req = request("5511", "hi");
        req.track_id = "crm".to_string();
        let record = req.into_record().unwrap();
        assert_eq!(record.chat.id, "5511@s.whatsapp.net");
        assert_eq!(record.message_type, MessageType::Text);
        assert_eq!(record.track_id, "crm");
        assert!(record.from_me && record.from_internal);
    }

    #[test]
    fn test_attachment_record() {
        let mut req = request("5511", "");
        req.mime = "image/png".to_string();
        req.file_name = "pic.png".to_string();
        req.content = STANDARD.encode(b"not really a png");

        let record = req.into_record().unwrap();
        assert_eq!(record.message_type, MessageType::Image);
        let attachment = record.attachment.unwrap();
        assert_eq!(attachment.file_length, 16);
        assert_eq!(attachment.file_name, "pic.png");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let mut req = request("5511", "");
        req.content = "%%%".to_string();
        assert!(req.into_record().is_err());
    }

    #[test]
    fn test_camel_case_aliases() {
        let req: SendRequest =
            serde_json::from_str(r#"{"chatId": "5511", "trackId": "t1", "text": "hi"}"#).unwrap();
        assert_eq!(req.chat_id, "5511");
        assert_eq!(req.track_id, "t1");
    }
}
