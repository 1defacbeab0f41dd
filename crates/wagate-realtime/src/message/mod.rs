//! Wire frames exchanged with push clients.

pub mod types;

pub use types::{InboundMessage, PushFrame};
