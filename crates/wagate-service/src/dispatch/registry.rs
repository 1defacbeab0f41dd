//! Event handler registry: one tenant's subscribers and their queues.

use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use wagate_entity::message::MessageRecord;
use wagate_realtime::PushHub;
use wagate_worker::{DeliveryMetrics, DeliveryQueue, EventSubscriber, SubscriberWorker};

#[derive(Debug)]
struct Registration {
    subscriber: Arc<dyn EventSubscriber>,
    queue: DeliveryQueue,
}

/// Fans a tenant's records out to its subscribers and push connections.
///
/// Each subscriber owns a bounded queue drained by its own worker, so
/// `trigger` never waits on delivery and a slow or failing subscriber
/// cannot hold back another one.
#[derive(Debug)]
pub struct HandlerRegistry {
    token: String,
    registrations: RwLock<Vec<Registration>>,
    push: Arc<PushHub>,
    shutdown: CancellationToken,
    capacity: usize,
    metrics: Arc<DeliveryMetrics>,
}

impl HandlerRegistry {
    /// Create an empty registry for `token`.
    ///
    /// Workers stop when `parent` is cancelled.
    pub fn new(
        token: impl Into<String>,
        push: Arc<PushHub>,
        parent: &CancellationToken,
        capacity: usize,
        metrics: Arc<DeliveryMetrics>,
    ) -> Self {
        Self {
            token: token.into(),
            registrations: RwLock::new(Vec::new()),
            push,
            shutdown: parent.child_token(),
            capacity,
            metrics,
        }
    }

    /// Add a subscriber. Returns false if one with the same id is present.
    pub fn register(&self, subscriber: Arc<dyn EventSubscriber>) -> bool {
        let mut registrations = self.write();
        if registrations
            .iter()
            .any(|r| r.subscriber.id() == subscriber.id())
        {
            return false;
        }

        let queue = SubscriberWorker::spawn(
            subscriber.clone(),
            self.capacity,
            &self.shutdown,
            self.metrics.clone(),
        );
        debug!(token = %self.token, subscriber = %subscriber.id(), "Subscriber registered");
        registrations.push(Registration { subscriber, queue });
        true
    }

    /// Remove a subscriber by id and stop its worker.
    pub fn unregister(&self, subscriber_id: &str) -> bool {
        let mut registrations = self.write();
        let Some(index) = registrations
            .iter()
            .position(|r| r.subscriber.id() == subscriber_id)
        else {
            return false;
        };

        let removed = registrations.remove(index);
        removed.queue.close();
        debug!(token = %self.token, subscriber = %subscriber_id, "Subscriber unregistered");
        true
    }

    /// Remove every subscriber.
    pub fn clear(&self) {
        let drained: Vec<Registration> = self.write().drain(..).collect();
        for registration in &drained {
            registration.queue.close();
        }
    }

    /// Queue `record` for every subscriber and push it to bound connections.
    ///
    /// Returns the number of subscriber queues that accepted the record.
    pub fn trigger(&self, record: MessageRecord) -> usize {
        let record = Arc::new(record);
        let mut accepted = 0;

        for registration in self.read().iter() {
            match registration.queue.submit(record.clone()) {
                Ok(()) => accepted += 1,
                Err(e) => warn!(
                    token = %self.token,
                    subscriber = %registration.subscriber.id(),
                    msg_id = %record.id,
                    error = %e,
                    "Record not queued for subscriber"
                ),
            }
        }

        self.push.dispatch(&self.token, &record);
        accepted
    }

    /// Whether any subscriber is registered.
    pub fn is_attached(&self) -> bool {
        !self.read().is_empty()
    }

    /// Ids of the registered subscribers.
    pub fn subscriber_ids(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|r| r.subscriber.id().to_string())
            .collect()
    }

    /// Stop every worker and drop all subscribers.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.clear();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Registration>> {
        self.registrations.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Registration>> {
        self.registrations.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use wagate_core::config::realtime::RealtimeConfig;
    use wagate_entity::message::{Chat, MessageType};
    use wagate_worker::{Delivery, SubscriberError};

    #[derive(Debug)]
    struct Counting {
        id: String,
        fail: bool,
        delivered: AtomicUsize,
    }

    impl Counting {
        fn new(id: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                fail,
                delivered: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EventSubscriber for Counting {
        fn id(&self) -> &str {
            &self.id
        }

        async fn deliver(&self, _record: Arc<MessageRecord>) -> Result<Delivery, SubscriberError> {
            if self.fail {
                tokio::time::sleep(Duration::from_millis(5)).await;
                return Err(SubscriberError::Transient("down".to_string()));
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(Delivery::Sent)
        }
    }

    fn registry(shutdown: &CancellationToken) -> HandlerRegistry {
        HandlerRegistry::new(
            "tok",
            Arc::new(PushHub::new(RealtimeConfig::default())),
            shutdown,
            64,
            Arc::new(DeliveryMetrics::new()),
        )
    }

    fn record(id: &str) -> MessageRecord {
        let mut record =
            MessageRecord::new(id, Chat::new("5511@s.whatsapp.net"), MessageType::Text, Utc::now());
        record.text = "hi".to_string();
        record
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let shutdown = CancellationToken::new();
        let registry = registry(&shutdown);
        let sub = Counting::new("a", false);

        assert!(registry.register(sub.clone()));
        assert!(!registry.register(sub));
        assert_eq!(registry.subscriber_ids(), vec!["a".to_string()]);
        assert!(registry.is_attached());

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(!registry.is_attached());
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_affect_others() {
        let shutdown = CancellationToken::new();
        let registry = registry(&shutdown);
        let failing = Counting::new("failing", true);
        let healthy = Counting::new("healthy", false);
        registry.register(failing);
        registry.register(healthy.clone());

        for i in 0..10 {
            assert_eq!(registry.trigger(record(&format!("M{i}"))), 2);
        }

        wait_for(&healthy.delivered, 10).await;
        assert_eq!(healthy.delivered.load(Ordering::SeqCst), 10);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_trigger_without_subscribers() {
        let shutdown = CancellationToken::new();
        let registry = registry(&shutdown);
        assert_eq!(registry.trigger(record("M1")), 0);
    }

    #[tokio::test]
    async fn test_shutdown_clears_subscribers() {
        let shutdown = CancellationToken::new();
        let registry = registry(&shutdown);
        registry.register(Counting::new("a", false));
        registry.shutdown();
        assert!(!registry.is_attached());
        assert!(!shutdown.is_cancelled());
    }
}
