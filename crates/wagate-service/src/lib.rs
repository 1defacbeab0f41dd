//! # wagate-service
//!
//! Tenant orchestration for Wagate. Each tenant runtime owns a protocol
//! session, a message cache and a handler registry that fans records out
//! to webhook subscribers and realtime push connections.
//!
//! Services follow constructor injection: repositories, the push hub and
//! the connection factory are handed in as `Arc` references.

pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod send;
pub mod tenant;

pub use dispatch::{HandlerRegistry, WebhookDispatcher};
pub use protocol::{ConnectionFactory, LoopbackFactory, ProtocolConnection, ProtocolEvent};
pub use registry::TenantRegistry;
pub use send::{SendRequest, SendResponse};
pub use tenant::{GatewaySettings, TenantInfo, TenantRuntime};
