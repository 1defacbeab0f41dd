//! Tenant (messaging account) entities.

pub mod model;
pub mod status;

pub use model::TenantConfig;
pub use status::TenantStatus;
