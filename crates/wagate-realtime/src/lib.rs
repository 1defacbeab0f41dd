//! # wagate-realtime
//!
//! Realtime push hub for Wagate. Provides:
//!
//! - Live connection bookkeeping with bounded per-connection send buffers
//! - Binding of connections to tenant tokens
//! - Best-effort push of new message records to every bound connection
//! - Lock-free counters for health reporting

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;

pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use hub::PushHub;
pub use metrics::{RealtimeMetrics, RealtimeMetricsSnapshot};
