//! Connection pool. Tracks live connections and their token bindings.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of live connections indexed by id and by tenant token.
///
/// Bindings are kept separately from handles: a binding whose connection
/// has no live handle is simply skipped on push.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Tenant token → bound connection IDs.
    by_token: DashMap<String, HashSet<ConnectionId>>,
    /// Connection ID → tokens it is bound to, for cleanup.
    tokens_of: DashMap<ConnectionId, HashSet<String>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection and every binding it holds.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        if let Some((_, tokens)) = self.tokens_of.remove(conn_id) {
            for token in tokens {
                let now_empty = match self.by_token.get_mut(&token) {
                    Some(mut ids) => {
                        ids.remove(conn_id);
                        ids.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.by_token.remove_if(&token, |_, ids| ids.is_empty());
                }
            }
        }
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Associates a connection with a tenant token. Returns `false` if
    /// the binding already existed.
    pub fn bind(&self, conn_id: ConnectionId, token: &str) -> bool {
        let added = self
            .by_token
            .entry(token.to_string())
            .or_default()
            .insert(conn_id);
        self.tokens_of
            .entry(conn_id)
            .or_default()
            .insert(token.to_string());
        added
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Live handles bound to a token.
    pub fn get_token_connections(&self, token: &str) -> Vec<Arc<ConnectionHandle>> {
        let ids: Vec<ConnectionId> = self
            .by_token
            .get(token)
            .map(|entry| entry.value().iter().copied().collect())
            .unwrap_or_default();
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Tokens a connection is bound to.
    pub fn tokens_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.tokens_of
            .get(conn_id)
            .map(|entry| entry.value().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of tokens with at least one binding.
    pub fn token_count(&self) -> usize {
        self.by_token.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle() -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(4);
        Arc::new(ConnectionHandle::new(tx))
    }

    #[test]
    fn test_remove_drops_all_bindings() {
        let pool = ConnectionPool::new();
        let conn = handle();
        pool.add(conn.clone());
        pool.bind(conn.id, "tok-a");
        pool.bind(conn.id, "tok-b");
        assert_eq!(pool.token_count(), 2);

        assert!(pool.remove(&conn.id).is_some());
        assert_eq!(pool.connection_count(), 0);
        assert_eq!(pool.token_count(), 0);
        assert!(pool.get_token_connections("tok-a").is_empty());
    }

    #[test]
    fn test_binding_without_handle_is_skipped() {
        let pool = ConnectionPool::new();
        let ghost = uuid::Uuid::new_v4();
        pool.bind(ghost, "tok");
        let live = handle();
        pool.add(live.clone());
        pool.bind(live.id, "tok");

        let conns = pool.get_token_connections("tok");
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].id, live.id);
    }

    #[test]
    fn test_bind_is_idempotent() {
        let pool = ConnectionPool::new();
        let conn = handle();
        pool.add(conn.clone());
        assert!(pool.bind(conn.id, "tok"));
        assert!(!pool.bind(conn.id, "tok"));
        assert_eq!(pool.get_token_connections("tok").len(), 1);
    }
}
