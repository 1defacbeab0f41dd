//! Tenant runtime, its options, and reply previews.

pub mod options;
pub mod runtime;
pub mod synopsis;

pub use options::{GatewaySettings, TenantOptions};
pub use runtime::{RevokeReport, RuntimeContext, TenantInfo, TenantRuntime};
