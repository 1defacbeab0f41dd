//! Per-subscription delivery filters.

use std::fmt;

use wagate_entity::message::{MessageRecord, MessageType};
use wagate_entity::webhook::WebhookConfig;

/// Why a record was not posted to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Discard or unclassified record.
    NotDeliverable,
    /// Text record with nothing in it.
    EmptyText,
    /// Read receipts disabled.
    ReadReceipts,
    /// Group messages disabled.
    Groups,
    /// Broadcast and newsletter messages disabled.
    Broadcasts,
    /// Calls disabled.
    Calls,
    /// Sent through this gateway and not forwarded back.
    Internal,
}

impl SkipReason {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDeliverable => "not_deliverable",
            Self::EmptyText => "empty_text",
            Self::ReadReceipts => "read_receipts",
            Self::Groups => "groups",
            Self::Broadcasts => "broadcasts",
            Self::Calls => "calls",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First rule that excludes `record` from `webhook`, if any.
///
/// Tri-state filters only exclude when explicitly disabled; an unset
/// filter lets the record through.
pub fn skip_reason(webhook: &WebhookConfig, record: &MessageRecord) -> Option<SkipReason> {
    if !record.message_type.is_deliverable() {
        return Some(SkipReason::NotDeliverable);
    }
    if record.message_type == MessageType::Text && record.text.trim().is_empty() {
        return Some(SkipReason::EmptyText);
    }

    let disabled = |flag: Option<bool>| flag == Some(false);

    if record.is_read_receipt() && disabled(webhook.read_receipts) {
        return Some(SkipReason::ReadReceipts);
    }
    if record.from_group() && disabled(webhook.groups) {
        return Some(SkipReason::Groups);
    }
    if record.from_broadcast() && disabled(webhook.broadcasts) {
        return Some(SkipReason::Broadcasts);
    }
    if record.is_call() && disabled(webhook.calls) {
        return Some(SkipReason::Calls);
    }
    if record.from_internal && !forwards_internal(webhook, record) {
        return Some(SkipReason::Internal);
    }
    None
}

fn forwards_internal(webhook: &WebhookConfig, record: &MessageRecord) -> bool {
    let track_id = webhook.track_id.as_str();
    if !track_id.is_empty() && track_id == record.track_id {
        // Our own send coming back; never echo it.
        return false;
    }
    webhook.forward_internal || !track_id.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wagate_entity::message::{Chat, READ_RECEIPT_ID};

    fn record(chat: &str, kind: MessageType) -> MessageRecord {
        let mut record = MessageRecord::new("M1", Chat::new(chat), kind, Utc::now());
        record.text = "hello".to_string();
        record
    }

    fn hook() -> WebhookConfig {
        WebhookConfig::new("tok", "http://localhost/hook")
    }

    #[test]
    fn test_group_filter_only_when_disabled() {
        let msg = record("1203630@g.us", MessageType::Text);
        let mut webhook = hook();
        assert_eq!(skip_reason(&webhook, &msg), None);

        webhook.groups = Some(true);
        assert_eq!(skip_reason(&webhook, &msg), None);

        webhook.groups = Some(false);
        assert_eq!(skip_reason(&webhook, &msg), Some(SkipReason::Groups));
    }

    #[test]
    fn test_broadcast_and_call_filters() {
        let mut webhook = hook();
        webhook.broadcasts = Some(false);
        webhook.calls = Some(false);

        let status = record("status", MessageType::Text);
        assert_eq!(skip_reason(&webhook, &status), Some(SkipReason::Broadcasts));

        let call = record("5511@s.whatsapp.net", MessageType::Call);
        assert_eq!(skip_reason(&webhook, &call), Some(SkipReason::Calls));
    }

    #[test]
    fn test_read_receipt_filter() {
        let mut receipt = record("5511@s.whatsapp.net", MessageType::System);
        receipt.id = READ_RECEIPT_ID.to_string();

        let mut webhook = hook();
        assert_eq!(skip_reason(&webhook, &receipt), None);
        webhook.read_receipts = Some(false);
        assert_eq!(skip_reason(&webhook, &receipt), Some(SkipReason::ReadReceipts));
    }

    #[test]
    fn test_pre_skips() {
        let webhook = hook();
        let discard = record("5511@s.whatsapp.net", MessageType::Discard);
        assert_eq!(skip_reason(&webhook, &discard), Some(SkipReason::NotDeliverable));

        let mut blank = record("5511@s.whatsapp.net", MessageType::Text);
        blank.text = "   ".to_string();
        assert_eq!(skip_reason(&webhook, &blank), Some(SkipReason::EmptyText));
    }

    #[test]
    fn test_internal_forwarding_rules() {
        let mut msg = record("5511@s.whatsapp.net", MessageType::Text);
        msg.from_internal = true;
        msg.track_id = "crm".to_string();

        let mut webhook = hook();
        assert_eq!(skip_reason(&webhook, &msg), Some(SkipReason::Internal));

        webhook.forward_internal = true;
        assert_eq!(skip_reason(&webhook, &msg), None);

        // Same origin system: suppressed even when forwarding.
        webhook.track_id = "crm".to_string();
        assert_eq!(skip_reason(&webhook, &msg), Some(SkipReason::Internal));

        // Different origin system: bridged without forward_internal.
        webhook.forward_internal = false;
        webhook.track_id = "erp".to_string();
        assert_eq!(skip_reason(&webhook, &msg), None);
    }
}
