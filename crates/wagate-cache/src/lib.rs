//! # wagate-cache
//!
//! In-process caches for Wagate:
//!
//! - **message**: the bounded, time-ordered per-tenant message store that
//!   backs polling, revoke and reply synopsis lookups
//! - **memory**: a [moka](https://crates.io/crates/moka) TTL cache for chat
//!   titles fetched from the protocol connection
//!
//! Neither survives a restart; the message store is rebuilt from history
//! replay.

pub mod memory;
pub mod message;

pub use memory::ChatTitleCache;
pub use message::MessageCache;
