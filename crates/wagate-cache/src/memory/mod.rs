//! moka-backed TTL caches.

pub mod title;

pub use title::ChatTitleCache;
