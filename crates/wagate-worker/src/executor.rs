//! What a subscriber worker delivers records to.

use std::sync::Arc;

use async_trait::async_trait;

use wagate_core::error::AppError;
use wagate_entity::message::MessageRecord;

/// A destination that receives a tenant's records one at a time.
#[async_trait]
pub trait EventSubscriber: Send + Sync + std::fmt::Debug {
    /// Stable identity used to deduplicate registrations.
    fn id(&self) -> &str;

    /// Deliver one record.
    async fn deliver(&self, record: Arc<MessageRecord>) -> Result<Delivery, SubscriberError>;
}

/// What happened to a record that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The record reached the subscriber.
    Sent,
    /// The subscriber's filters excluded the record.
    Skipped,
}

/// Error from a delivery attempt
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// Transient failure, worth retrying with the next record
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// The record can never be delivered
    #[error("Permanent delivery failure: {0}")]
    Permanent(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}
