//! Shared value types used across crates.

pub mod option_boolean;

pub use option_boolean::OptionBoolean;
