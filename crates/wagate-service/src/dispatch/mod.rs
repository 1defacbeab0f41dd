//! Record fan-out: per-tenant handler registry and webhook delivery.

pub mod client;
pub mod filter;
pub mod registry;
pub mod webhook;

pub use client::build_http_client;
pub use filter::{SkipReason, skip_reason};
pub use registry::HandlerRegistry;
pub use webhook::{DeliveryError, SharedWid, WID_HEADER, WebhookDispatcher};
