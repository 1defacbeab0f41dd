//! Chat title memoization.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use wagate_core::config::cache::CacheConfig;

/// Memoizes chat titles looked up on the protocol connection.
#[derive(Debug, Clone)]
pub struct ChatTitleCache {
    cache: Cache<String, String>,
}

impl ChatTitleCache {
    /// Create a title cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.chat_title_capacity)
            .time_to_live(Duration::from_secs(config.chat_title_ttl_seconds))
            .build();
        Self { cache }
    }

    fn key(chat_id: &str) -> String {
        chat_id.to_lowercase()
    }

    /// Return a cached title.
    pub async fn get(&self, chat_id: &str) -> Option<String> {
        self.cache.get(&Self::key(chat_id)).await
    }

    /// Store a title. Empty titles are not cached.
    pub async fn insert(&self, chat_id: &str, title: impl Into<String>) {
        let title = title.into();
        if !title.is_empty() {
            self.cache.insert(Self::key(chat_id), title).await;
        }
    }

    /// Return the cached title, or run `fetch` once and cache a non-empty result.
    ///
    /// Concurrent callers for the same chat share one fetch.
    pub async fn get_or_fetch<F>(&self, chat_id: &str, fetch: F) -> Option<String>
    where
        F: Future<Output = Option<String>>,
    {
        let key = Self::key(chat_id);
        let title = self
            .cache
            .optionally_get_with(key, async move { fetch.await.filter(|t| !t.is_empty()) })
            .await;
        if title.is_none() {
            debug!(chat_id, "No title available for chat");
        }
        title
    }

    /// Drop a cached title.
    pub async fn invalidate(&self, chat_id: &str) {
        self.cache.invalidate(&Self::key(chat_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_cache() -> ChatTitleCache {
        ChatTitleCache::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_is_memoized() {
        let cache = make_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let title = cache
                .get_or_fetch("123@S.WHATSAPP.NET", async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some("Alice".to_string())
                })
                .await;
            assert_eq!(title.as_deref(), Some("Alice"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("123@s.whatsapp.net").await.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_empty_title_is_not_cached() {
        let cache = make_cache();
        let title = cache
            .get_or_fetch("1@g.us", async { Some(String::new()) })
            .await;
        assert!(title.is_none());

        cache.insert("1@g.us", "").await;
        assert!(cache.get("1@g.us").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = make_cache();
        cache.insert("1@g.us", "Team").await;
        cache.invalidate("1@g.us").await;
        assert!(cache.get("1@g.us").await.is_none());
    }
}
