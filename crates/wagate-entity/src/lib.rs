//! # wagate-entity
//!
//! Domain models for Wagate. The message types are pure value objects;
//! the tenant and webhook configs are database rows and additionally
//! derive `sqlx::FromRow`.

pub mod message;
pub mod tenant;
pub mod webhook;
