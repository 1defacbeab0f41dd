//! Custom Axum extractors.

pub mod path;
pub mod token;

pub use path::path_param;
pub use token::{TOKEN_HEADER, TenantToken};
