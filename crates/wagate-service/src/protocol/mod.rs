//! Seam between the gateway core and the messaging protocol client.
//!
//! The protocol client itself is an external collaborator. It is consumed
//! through [`ProtocolConnection`] for outbound operations and produces
//! normalized [`ProtocolEvent`]s for inbound ones.

pub mod connection;
pub mod event;
pub mod loopback;

pub use connection::{ConnectionFactory, ProtocolConnection};
pub use event::{EventSender, ProtocolEvent};
pub use loopback::{LoopbackConnection, LoopbackFactory};
