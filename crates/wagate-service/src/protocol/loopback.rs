//! In-process protocol connection.
//!
//! Used when no network client is wired in (development) and by tests.
//! Outbound operations are recorded instead of transmitted, and inbound
//! events are injected by the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use wagate_core::error::AppError;
use wagate_core::result::AppResult;
use wagate_entity::message::MessageRecord;
use wagate_entity::tenant::TenantConfig;

use super::connection::{ConnectionFactory, ProtocolConnection};
use super::event::{EventSender, ProtocolEvent};

fn push<T>(list: &Mutex<Vec<T>>, item: T) {
    list.lock().unwrap_or_else(|e| e.into_inner()).push(item);
}

fn snapshot<T: Clone>(list: &Mutex<Vec<T>>) -> Vec<T> {
    list.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Generate a network-style message id.
pub fn generate_message_id() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("3EB0{}", &raw[..16])
}

/// A connection that records outbound operations.
#[derive(Debug)]
pub struct LoopbackConnection {
    wid: String,
    events: EventSender,
    connected: AtomicBool,
    logged_out: AtomicBool,
    sent: Mutex<Vec<MessageRecord>>,
    revoked: Mutex<Vec<String>>,
    read: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
    history: Mutex<Vec<String>>,
    titles: DashMap<String, String>,
}

impl LoopbackConnection {
    /// Create a connected loopback session.
    pub fn new(wid: impl Into<String>, events: EventSender) -> Self {
        Self {
            wid: wid.into(),
            events,
            connected: AtomicBool::new(true),
            logged_out: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
            read: Mutex::new(Vec::new()),
            rejected: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            titles: DashMap::new(),
        }
    }

    /// Deliver an event to the owning runtime, as the network would.
    pub fn inject(&self, event: ProtocolEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Preset the title returned for a chat.
    pub fn set_title(&self, chat_id: &str, title: &str) {
        self.titles.insert(chat_id.to_string(), title.to_string());
    }

    /// Messages passed to `send`, with their assigned ids.
    pub fn sent(&self) -> Vec<MessageRecord> {
        snapshot(&self.sent)
    }

    /// Ids passed to `revoke`.
    pub fn revoked(&self) -> Vec<String> {
        snapshot(&self.revoked)
    }

    /// Ids passed to `mark_read`.
    pub fn marked_read(&self) -> Vec<String> {
        snapshot(&self.read)
    }

    /// Call ids passed to `reject_call`.
    pub fn rejected_calls(&self) -> Vec<String> {
        snapshot(&self.rejected)
    }

    /// Anchor ids passed to `request_history`.
    pub fn history_requests(&self) -> Vec<String> {
        snapshot(&self.history)
    }

    /// Whether `logout` was called.
    pub fn is_logged_out(&self) -> bool {
        self.logged_out.load(Ordering::SeqCst)
    }

    /// Whether the transport is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> AppResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(AppError::service_unavailable("connection closed"))
        }
    }
}

#[async_trait]
impl ProtocolConnection for LoopbackConnection {
    fn wid(&self) -> Option<String> {
        Some(self.wid.clone())
    }

    async fn send(&self, record: &MessageRecord) -> AppResult<String> {
        self.ensure_connected()?;
        let mut sent = record.clone();
        if sent.id.is_empty() {
            sent.id = generate_message_id();
        }
        let id = sent.id.clone();
        debug!(wid = %self.wid, msg_id = %id, chat = %sent.chat.id, "Loopback send");
        push(&self.sent, sent);
        Ok(id)
    }

    async fn revoke(&self, record: &MessageRecord) -> AppResult<()> {
        self.ensure_connected()?;
        push(&self.revoked, record.id.clone());
        Ok(())
    }

    async fn mark_read(&self, record: &MessageRecord) -> AppResult<()> {
        self.ensure_connected()?;
        push(&self.read, record.id.clone());
        Ok(())
    }

    async fn reject_call(&self, record: &MessageRecord) -> AppResult<()> {
        self.ensure_connected()?;
        push(&self.rejected, record.id.clone());
        Ok(())
    }

    async fn request_history(&self, anchor: &MessageRecord) -> AppResult<()> {
        self.ensure_connected()?;
        push(&self.history, anchor.id.clone());
        Ok(())
    }

    async fn chat_title(&self, chat_id: &str) -> Option<String> {
        self.titles.get(chat_id).map(|entry| entry.value().clone())
    }

    async fn logout(&self) -> AppResult<()> {
        self.ensure_connected()?;
        self.logged_out.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Creates [`LoopbackConnection`]s and keeps them reachable by token.
#[derive(Debug, Default)]
pub struct LoopbackFactory {
    connections: DashMap<String, Arc<LoopbackConnection>>,
}

impl LoopbackFactory {
    /// Create a factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest connection opened for a tenant.
    pub fn connection(&self, token: &str) -> Option<Arc<LoopbackConnection>> {
        self.connections.get(token).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl ConnectionFactory for LoopbackFactory {
    async fn connect(
        &self,
        config: &TenantConfig,
        events: EventSender,
    ) -> AppResult<Arc<dyn ProtocolConnection>> {
        let wid = config
            .wid()
            .ok_or_else(|| AppError::service_unavailable("tenant is not paired"))?
            .to_string();

        let connection = Arc::new(LoopbackConnection::new(wid.clone(), events));
        connection.inject(ProtocolEvent::Connected { wid });
        self.connections
            .insert(config.token.clone(), connection.clone());
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_send_assigns_id_when_missing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = LoopbackConnection::new("5511@s.whatsapp.net", tx);
        let record = MessageRecord::default();

        let id = conn.send(&record).await.unwrap();
        assert!(id.starts_with("3EB0"));
        assert_eq!(id.len(), 20);
        assert_eq!(conn.sent()[0].id, id);
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_send() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = LoopbackConnection::new("5511@s.whatsapp.net", tx);
        conn.disconnect().await;
        assert!(conn.send(&MessageRecord::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_factory_requires_pairing() {
        let factory = LoopbackFactory::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = TenantConfig::new("tok");
        assert!(factory.connect(&config, tx.clone()).await.is_err());

        config.wid = Some("5511@s.whatsapp.net".to_string());
        factory.connect(&config, tx).await.unwrap();
        assert!(factory.connection("tok").is_some());
        assert!(matches!(rx.recv().await, Some(ProtocolEvent::Connected { .. })));
    }
}
