//! # wagate-core
//!
//! Core crate for Wagate. Contains configuration schemas, the tri-state
//! option boolean used for per-tenant and per-webhook filters, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Wagate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
