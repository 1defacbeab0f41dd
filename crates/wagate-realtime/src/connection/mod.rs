//! Connection handles and the token-indexed pool.

pub mod handle;
pub mod pool;
