//! Subscriber worker. Drains one queue into one subscriber, in order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use wagate_entity::message::MessageRecord;

use crate::executor::{Delivery, EventSubscriber, SubscriberError};
use crate::metrics::DeliveryMetrics;
use crate::queue::DeliveryQueue;

/// Background task delivering a subscriber's records one at a time.
#[derive(Debug)]
pub struct SubscriberWorker {
    subscriber: Arc<dyn EventSubscriber>,
    receiver: mpsc::Receiver<Arc<MessageRecord>>,
    cancel: CancellationToken,
    metrics: Arc<DeliveryMetrics>,
}

impl SubscriberWorker {
    /// Spawn a worker for `subscriber` and return its queue.
    ///
    /// The worker stops when `parent` is cancelled, when the queue is
    /// closed, or when every queue handle has been dropped.
    pub fn spawn(
        subscriber: Arc<dyn EventSubscriber>,
        capacity: usize,
        parent: &CancellationToken,
        metrics: Arc<DeliveryMetrics>,
    ) -> DeliveryQueue {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = parent.child_token();
        let queue = DeliveryQueue::new(
            Arc::from(subscriber.id()),
            tx,
            cancel.clone(),
            metrics.clone(),
        );

        let worker = Self {
            subscriber,
            receiver: rx,
            cancel,
            metrics,
        };
        tokio::spawn(worker.run());
        queue
    }

    async fn run(mut self) {
        let id = self.subscriber.id().to_string();
        tracing::debug!(subscriber = %id, "Subscriber worker started");

        loop {
            let record = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(record) => record,
                    None => break,
                },
            };

            let msg_id = record.id.clone();
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!(subscriber = %id, msg_id = %msg_id, "In-flight delivery detached");
                    break;
                }
                result = self.subscriber.deliver(record) => result,
            };

            match result {
                Ok(Delivery::Sent) => {
                    self.metrics.record_sent();
                    tracing::debug!(subscriber = %id, msg_id = %msg_id, "Record delivered");
                }
                Ok(Delivery::Skipped) => {
                    self.metrics.record_skipped();
                    tracing::trace!(subscriber = %id, msg_id = %msg_id, "Record skipped by filters");
                }
                Err(SubscriberError::Transient(msg)) => {
                    self.metrics.record_failed();
                    tracing::warn!(subscriber = %id, msg_id = %msg_id, "Delivery failed (transient): {}", msg);
                }
                Err(SubscriberError::Permanent(msg)) => {
                    self.metrics.record_failed();
                    tracing::error!(subscriber = %id, msg_id = %msg_id, "Delivery failed permanently: {}", msg);
                }
                Err(SubscriberError::Internal(err)) => {
                    self.metrics.record_failed();
                    tracing::error!(subscriber = %id, msg_id = %msg_id, "Delivery internal error: {}", err);
                }
            }
        }

        tracing::debug!(subscriber = %id, "Subscriber worker stopped");
    }
}
