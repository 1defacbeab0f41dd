//! Bounded per-subscriber queue handle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use wagate_entity::message::MessageRecord;

use crate::metrics::DeliveryMetrics;

/// Why a record was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The subscriber is too far behind.
    #[error("delivery queue is full")]
    Full,
    /// The worker has stopped.
    #[error("delivery queue is closed")]
    Closed,
}

/// Producer side of one subscriber's queue.
///
/// Submitting never waits: a full queue drops the record for this
/// subscriber only.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    subscriber_id: Arc<str>,
    sender: mpsc::Sender<Arc<MessageRecord>>,
    cancel: CancellationToken,
    metrics: Arc<DeliveryMetrics>,
}

impl DeliveryQueue {
    pub(crate) fn new(
        subscriber_id: Arc<str>,
        sender: mpsc::Sender<Arc<MessageRecord>>,
        cancel: CancellationToken,
        metrics: Arc<DeliveryMetrics>,
    ) -> Self {
        Self {
            subscriber_id,
            sender,
            cancel,
            metrics,
        }
    }

    /// Identity of the subscriber this queue feeds.
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// Queue a record without waiting.
    pub fn submit(&self, record: Arc<MessageRecord>) -> Result<(), SubmitError> {
        if self.cancel.is_cancelled() {
            self.metrics.record_dropped();
            return Err(SubmitError::Closed);
        }
        match self.sender.try_send(record) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                Err(SubmitError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_dropped();
                Err(SubmitError::Closed)
            }
        }
    }

    /// Records waiting in the queue.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Stop the worker. Queued records are abandoned.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has been stopped.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}
