//! Ordered background delivery for Wagate.
//!
//! This crate provides:
//! - The [`EventSubscriber`] contract implemented by webhook dispatchers
//! - A bounded queue per subscriber so records reach each subscriber in
//!   the order they were triggered
//! - A worker task per queue that isolates one subscriber's latency and
//!   failures from every other subscriber and from the ingestion path

pub mod executor;
pub mod metrics;
pub mod queue;
pub mod runner;

pub use executor::{Delivery, EventSubscriber, SubscriberError};
pub use metrics::{DeliveryMetrics, DeliveryMetricsSnapshot};
pub use queue::{DeliveryQueue, SubmitError};
pub use runner::SubscriberWorker;
