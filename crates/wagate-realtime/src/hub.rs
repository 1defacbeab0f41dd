//! Push hub. Tracks connections and pushes records to those bound to a tenant token.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use wagate_core::config::realtime::RealtimeConfig;
use wagate_entity::message::MessageRecord;

use crate::connection::handle::{ConnectionHandle, ConnectionId, SendOutcome};
use crate::connection::pool::ConnectionPool;
use crate::message::types::{InboundMessage, PushFrame};
use crate::metrics::RealtimeMetrics;

/// Maps live connections to tenant tokens and pushes records to them.
///
/// Push is best-effort: full buffers drop the frame, dead transports are
/// skipped, and nothing is ever reported back to the caller as an error.
#[derive(Debug)]
pub struct PushHub {
    /// Connection pool.
    pool: ConnectionPool,
    /// Metrics.
    metrics: Arc<RealtimeMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl PushHub {
    /// Creates a new push hub.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            pool: ConnectionPool::new(),
            metrics: Arc::new(RealtimeMetrics::new()),
            config,
        }
    }

    /// Registers a new connection.
    ///
    /// Returns the connection handle and the receiver the transport task
    /// drains into the socket.
    pub fn on_connect(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        info!(conn_id = %handle.id, "Push connection registered");
        (handle, rx)
    }

    /// Unregisters a connection and removes all of its bindings.
    pub fn on_disconnect(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.metrics.connection_closed();
            info!(conn_id = %conn_id, "Push connection unregistered");
        }
    }

    /// Associates a connection with a tenant token.
    pub fn bind_token(&self, conn_id: ConnectionId, token: &str) -> bool {
        let added = self.pool.bind(conn_id, token);
        if added {
            self.metrics.binding_added();
            debug!(conn_id = %conn_id, token, "Connection bound to token");
        }
        added
    }

    /// Processes a raw frame from a client.
    ///
    /// A bind request is accepted when `is_known_token` approves it. The
    /// client gets a `bound` or `error` frame back. Returns the bound token.
    pub fn handle_inbound(
        &self,
        conn_id: ConnectionId,
        raw: &str,
        is_known_token: impl Fn(&str) -> bool,
    ) -> Option<String> {
        let reply = |frame: PushFrame| {
            if let Some(handle) = self.pool.get(&conn_id) {
                if let Ok(text) = serde_json::to_string(&frame) {
                    handle.send(text);
                }
            }
        };

        let InboundMessage::Bind { token } = match serde_json::from_str::<InboundMessage>(raw) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Unparseable push frame");
                reply(PushFrame::error("INVALID_MESSAGE", format!("Failed to parse message: {e}")));
                return None;
            }
        };

        if !is_known_token(&token) {
            reply(PushFrame::error("UNKNOWN_TOKEN", "Token not found"));
            return None;
        }

        self.bind_token(conn_id, &token);
        reply(PushFrame::bound(&token));
        Some(token)
    }

    /// Pushes a record to every connection bound to `token`.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn dispatch(&self, token: &str, record: &MessageRecord) -> usize {
        let connections = self.pool.get_token_connections(token);
        if connections.is_empty() {
            return 0;
        }

        let frame = match PushFrame::message(&self.config.message_target, record)
            .and_then(|f| serde_json::to_string(&f))
        {
            Ok(text) => text,
            Err(e) => {
                error!(token, msg_id = %record.id, error = %e, "Failed to serialize push frame");
                return 0;
            }
        };

        let mut pushed = 0u64;
        let mut dropped = 0u64;
        for conn in &connections {
            match conn.send(frame.clone()) {
                SendOutcome::Sent => pushed += 1,
                SendOutcome::Dropped | SendOutcome::Closed => dropped += 1,
            }
        }

        self.metrics.frames_pushed(pushed);
        self.metrics.frames_dropped(dropped);
        pushed as usize
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            conn.mark_dead();
            self.pool.remove(&conn.id);
            self.metrics.connection_closed();
        }
        info!(count = all.len(), "All push connections closed");
    }

    /// Returns the live connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Tokens a connection is bound to.
    pub fn tokens_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.pool.tokens_of(conn_id)
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }
}
