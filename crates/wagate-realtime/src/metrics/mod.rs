//! Push hub metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Hub-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections established
    connections_total: AtomicU64,
    /// Connections currently active
    connections_active: AtomicU64,
    /// Token bindings made
    bindings_total: AtomicU64,
    /// Frames queued to a connection
    frames_pushed: AtomicU64,
    /// Frames dropped because a buffer was full or the transport gone
    frames_dropped: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection.
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection.
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Record a token binding.
    pub fn binding_added(&self) {
        self.bindings_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record pushed frames.
    pub fn frames_pushed(&self, count: u64) {
        self.frames_pushed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record dropped frames.
    pub fn frames_dropped(&self, count: u64) {
        self.frames_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> RealtimeMetricsSnapshot {
        RealtimeMetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            bindings_total: self.bindings_total.load(Ordering::Relaxed),
            frames_pushed: self.frames_pushed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeMetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently active connections
    pub connections_active: u64,
    /// Total token bindings
    pub bindings_total: u64,
    /// Total frames pushed
    pub frames_pushed: u64,
    /// Total frames dropped
    pub frames_dropped: u64,
}
