//! Per-tenant message store.

pub mod store;

pub use store::MessageCache;
