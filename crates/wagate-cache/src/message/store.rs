//! Bounded, time-ordered message store.
//!
//! One instance per tenant. Keys are normalized (uppercased) message ids.
//! Every mutation runs under a single write lock; reads share a read lock.
//! No I/O happens while a lock is held.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use wagate_entity::message::MessageRecord;

/// Thread-safe message cache for one tenant.
#[derive(Debug, Default)]
pub struct MessageCache {
    entries: RwLock<HashMap<String, MessageRecord>>,
    counter: AtomicU64,
}

fn chronological(a: &MessageRecord, b: &MessageRecord) -> CmpOrdering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.key().cmp(&b.key()))
}

impl MessageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, MessageRecord>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, MessageRecord>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a record.
    ///
    /// Returns `true` when the record is new or its content differs from
    /// the entry it replaced, `false` for a content-identical replay.
    pub fn put(&self, record: MessageRecord) -> bool {
        let key = record.key();
        let mut entries = self.write();
        let different = match entries.get(&key) {
            Some(previous) => !previous.content_equals(&record),
            None => {
                self.counter.fetch_add(1, Ordering::Relaxed);
                true
            }
        };
        entries.insert(key, record);
        different
    }

    /// Look up a record by id, case-insensitively.
    pub fn get(&self, id: &str) -> Option<MessageRecord> {
        self.read().get(&MessageRecord::normalize_id(id)).cloned()
    }

    /// All records whose id starts with `prefix`, case-insensitively.
    pub fn get_by_prefix(&self, prefix: &str) -> Vec<MessageRecord> {
        let prefix = MessageRecord::normalize_id(prefix);
        self.read()
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// All records strictly newer than `timestamp`, unordered.
    pub fn get_since(&self, timestamp: DateTime<Utc>) -> Vec<MessageRecord> {
        self.read()
            .values()
            .filter(|record| record.timestamp > timestamp)
            .cloned()
            .collect()
    }

    /// Snapshot ordered by timestamp, then id.
    pub fn get_ordered(&self) -> Vec<MessageRecord> {
        let mut records: Vec<MessageRecord> = self.read().values().cloned().collect();
        records.sort_by(chronological);
        records
    }

    /// The earliest record with a real timestamp strictly before now.
    pub fn get_oldest_unprocessed(&self) -> Option<MessageRecord> {
        let now = Utc::now();
        self.read()
            .values()
            .filter(|record| record.has_timestamp() && record.timestamp < now)
            .min_by(|a, b| chronological(a, b))
            .cloned()
    }

    /// Evict the oldest entries until at most `max_size` remain.
    ///
    /// A `max_size` of 0 disables eviction. Returns the number evicted.
    pub fn clean_up(&self, max_size: u64) -> usize {
        if max_size == 0 || self.count() <= max_size {
            return 0;
        }

        let mut entries = self.write();
        let len = entries.len() as u64;
        if len <= max_size {
            return 0;
        }

        let mut ordered: Vec<(&String, &MessageRecord)> = entries.iter().collect();
        ordered.sort_by(|a, b| chronological(a.1, b.1));
        let excess = (len - max_size) as usize;
        let victims: Vec<String> = ordered
            .into_iter()
            .take(excess)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &victims {
            if entries.remove(key).is_some() {
                self.counter.fetch_sub(1, Ordering::Relaxed);
            }
        }

        debug!(evicted = victims.len(), max_size, "Message cache cleaned up");
        victims.len()
    }

    /// Remove one record. Returns the removed record, if it existed.
    pub fn delete(&self, id: &str) -> Option<MessageRecord> {
        let removed = self.write().remove(&MessageRecord::normalize_id(id));
        if removed.is_some() {
            self.counter.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop every record.
    pub fn clear(&self) {
        let mut entries = self.write();
        entries.clear();
        self.counter.store(0, Ordering::Relaxed);
    }

    /// Live record count.
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use wagate_entity::message::{Chat, MessageType};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn record(id: &str, ts: DateTime<Utc>, text: &str) -> MessageRecord {
        let mut r = MessageRecord::new(id, Chat::new("1@s.whatsapp.net"), MessageType::Text, ts);
        r.text = text.to_string();
        r
    }

    #[test]
    fn test_put_identical_is_not_different() {
        let cache = MessageCache::new();
        assert!(cache.put(record("abc", t0(), "hi")));
        assert_eq!(cache.count(), 1);

        assert!(!cache.put(record("abc", t0(), "hi")));
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_put_changed_content_is_different() {
        let cache = MessageCache::new();
        cache.put(record("abc", t0(), "hi"));
        assert!(cache.put(record("ABC", t0(), "hi, edited")));
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.get("abc").map(|r| r.text), Some("hi, edited".to_string()));
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let cache = MessageCache::new();
        cache.put(record("abc", t0(), "hi"));
        let found = cache.get("ABC").expect("record");
        assert_eq!(found.id, "abc");
        assert!(cache.get("abd").is_none());
    }

    #[test]
    fn test_ordered_breaks_ties_by_id() {
        let cache = MessageCache::new();
        cache.put(record("B", t0(), "b"));
        cache.put(record("A", t0(), "a"));
        cache.put(record("C", t0() - Duration::seconds(1), "c"));

        let ids: Vec<String> = cache.get_ordered().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_clean_up_keeps_most_recent() {
        let cache = MessageCache::new();
        for (i, id) in ["one", "two", "three"].iter().enumerate() {
            cache.put(record(id, t0() + Duration::seconds(i as i64), id));
        }

        assert_eq!(cache.clean_up(2), 1);
        assert_eq!(cache.count(), 2);
        assert!(cache.get("one").is_none());
        assert!(cache.get("two").is_some());
        assert!(cache.get("three").is_some());
    }

    #[test]
    fn test_clean_up_zero_is_unbounded() {
        let cache = MessageCache::new();
        for i in 0..10 {
            cache.put(record(&format!("m{i}"), t0(), "x"));
        }
        assert_eq!(cache.clean_up(0), 0);
        assert_eq!(cache.count(), 10);
    }

    #[test]
    fn test_prefix_and_since_queries() {
        let cache = MessageCache::new();
        cache.put(record("3EB0AA", t0(), "a"));
        cache.put(record("3eb0bb", t0() + Duration::seconds(5), "b"));
        cache.put(record("BAE5CC", t0() + Duration::seconds(10), "c"));

        let mut prefixed: Vec<String> =
            cache.get_by_prefix("3eb0").into_iter().map(|r| r.id).collect();
        prefixed.sort();
        assert_eq!(prefixed, vec!["3EB0AA", "3eb0bb"]);

        let since = cache.get_since(t0());
        assert_eq!(since.len(), 2);
        assert!(since.iter().all(|r| r.timestamp > t0()));
    }

    #[test]
    fn test_oldest_unprocessed_skips_zero_and_future() {
        let cache = MessageCache::new();
        cache.put(record("zero", DateTime::<Utc>::UNIX_EPOCH, "z"));
        cache.put(record("future", Utc::now() + Duration::hours(1), "f"));
        cache.put(record("late", t0() + Duration::seconds(30), "l"));
        cache.put(record("early", t0(), "e"));

        assert_eq!(cache.get_oldest_unprocessed().map(|r| r.id), Some("early".to_string()));
    }

    #[test]
    fn test_delete_decrements_counter() {
        let cache = MessageCache::new();
        cache.put(record("abc", t0(), "hi"));
        assert!(cache.delete("ABC").is_some());
        assert!(cache.delete("ABC").is_none());
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_concurrent_puts_count_once_per_id() {
        let cache = Arc::new(MessageCache::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let ts = t0() + Duration::seconds(i);
                        cache.put(record(&format!("msg{i}"), ts, &format!("w{worker}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.count(), 100);
        assert_eq!(cache.get_ordered().len(), 100);
    }
}
