//! Protocol connection contracts.

use std::sync::Arc;

use async_trait::async_trait;

use wagate_core::result::AppResult;
use wagate_entity::message::MessageRecord;
use wagate_entity::tenant::TenantConfig;

use super::event::EventSender;

/// An established session for one tenant.
#[async_trait]
pub trait ProtocolConnection: Send + Sync + std::fmt::Debug {
    /// Session identity, once known.
    fn wid(&self) -> Option<String>;

    /// Send a message. Returns the network id assigned to it.
    async fn send(&self, record: &MessageRecord) -> AppResult<String>;

    /// Revoke (delete for everyone) a previously sent message.
    async fn revoke(&self, record: &MessageRecord) -> AppResult<()>;

    /// Mark a received message as read.
    async fn mark_read(&self, record: &MessageRecord) -> AppResult<()>;

    /// Decline an incoming call.
    async fn reject_call(&self, record: &MessageRecord) -> AppResult<()>;

    /// Ask the network for history older than `anchor`. Results arrive as a
    /// history batch event.
    async fn request_history(&self, anchor: &MessageRecord) -> AppResult<()>;

    /// Look up the display name of a chat or contact.
    async fn chat_title(&self, chat_id: &str) -> Option<String>;

    /// Invalidate the session on the network.
    async fn logout(&self) -> AppResult<()>;

    /// Close the transport, keeping session credentials.
    async fn disconnect(&self);
}

/// Creates connections for tenants.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + std::fmt::Debug {
    /// Open a session for `config`, reporting events on `events`.
    async fn connect(
        &self,
        config: &TenantConfig,
        events: EventSender,
    ) -> AppResult<Arc<dyn ProtocolConnection>>;
}
