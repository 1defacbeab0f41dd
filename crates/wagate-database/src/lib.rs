//! # wagate-database
//!
//! Tenant persistence for Wagate: the [`TenantRepository`] contract, a
//! PostgreSQL implementation with embedded migrations, and an in-memory
//! implementation for development and tests.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{
    InMemoryTenantRepository, PgTenantRepository, TenantRepository, open_repository,
};
