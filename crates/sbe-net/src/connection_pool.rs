//! Connection Pool
//!
//! Keeps one open connection per endpoint for keep-alive reuse.
//!
//! A connection is checked out of the pool for the whole duration of a
//! request, so at most one request holds an endpoint's connection at a time.
//! The lock is only held for lookup, insert and eviction, never across I/O.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use crate::tcp::BufferedConnection;
use crate::transport::Transport;

/// Connection ID
pub type ConnId = u32;

/// Host key for connection pooling
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey {
    pub host: Box<str>,
    pub port: u16,
    pub is_tls: bool,
}

impl HostKey {
    pub fn new(host: &str, port: u16, is_tls: bool) -> Self {
        Self {
            host: host.into(),
            port,
            is_tls,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_tls { "https" } else { "http" }
    }
}

impl std::fmt::Display for HostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

/// Pooled connection
pub struct PooledConnection {
    /// Connection ID
    pub id: ConnId,
    /// Endpoint this connection talks to
    pub key: HostKey,
    /// Buffered (possibly TLS-wrapped) stream
    pub stream: BufferedConnection<Box<dyn Transport>>,
    /// Created at
    pub created_at: Instant,
    /// Last used at
    pub last_used: Instant,
    /// Request count on this connection
    pub request_count: u32,
}

impl PooledConnection {
    /// Mark the start of a request
    fn touch(&mut self) {
        self.last_used = Instant::now();
        self.request_count += 1;
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("request_count", &self.request_count)
            .finish_non_exhaustive()
    }
}

/// Connection pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub connections_created: u64,
    pub connections_reused: u64,
    pub connections_closed: u64,
}

impl PoolStats {
    pub fn reuse_rate(&self) -> f64 {
        let total = self.connections_created + self.connections_reused;
        if total == 0 {
            0.0
        } else {
            self.connections_reused as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct PoolInner {
    idle: HashMap<HostKey, PooledConnection>,
    stats: PoolStats,
}

/// Connection pool
#[derive(Default)]
pub struct ConnectionPool {
    inner: Mutex<PoolInner>,
    /// Next connection ID
    next_id: AtomicU32,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // Critical sections never leave the map half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check out the cached connection for `key`, if any
    pub fn acquire(&self, key: &HostKey) -> Option<PooledConnection> {
        let mut inner = self.lock();
        let mut conn = inner.idle.remove(key)?;
        inner.stats.connections_reused += 1;
        drop(inner);

        conn.touch();
        Some(conn)
    }

    /// Wrap a freshly opened stream as a checked-out connection for `key`
    pub fn register(&self, key: &HostKey, stream: BufferedConnection<Box<dyn Transport>>) -> PooledConnection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().stats.connections_created += 1;

        let now = Instant::now();
        let mut conn = PooledConnection {
            id,
            key: key.clone(),
            stream,
            created_at: now,
            last_used: now,
            request_count: 0,
        };
        conn.touch();
        conn
    }

    /// Return a healthy connection to the pool
    pub fn release(&self, conn: PooledConnection) {
        let displaced = {
            let mut inner = self.lock();
            let displaced = inner.idle.insert(conn.key.clone(), conn);
            if displaced.is_some() {
                inner.stats.connections_closed += 1;
            }
            displaced
        };

        // Another request opened a second connection meanwhile; keep the newest
        if let Some(old) = displaced {
            tracing::debug!("Closing surplus connection {} to {}", old.id, old.key);
        }
    }

    /// Remove `key` from the pool and close `conn`
    ///
    /// After this returns no caller can observe a cached connection for
    /// `key`; the next request opens a fresh one.
    pub fn evict(&self, key: &HostKey, conn: Option<PooledConnection>) {
        let cached = {
            let mut inner = self.lock();
            let cached = inner.idle.remove(key);
            let closed = cached.is_some() as u64 + conn.is_some() as u64;
            inner.stats.connections_closed += closed;
            cached
        };

        drop(cached);
        drop(conn);
    }

    /// Close a checked-out connection without returning it
    pub fn close(&self, conn: PooledConnection) {
        self.lock().stats.connections_closed += 1;
        drop(conn);
    }

    /// Close every cached connection
    pub fn clear(&self) {
        let drained: Vec<_> = {
            let mut inner = self.lock();
            let drained: Vec<_> = inner.idle.drain().map(|(_, conn)| conn).collect();
            inner.stats.connections_closed += drained.len() as u64;
            drained
        };
        drop(drained);
    }

    /// Whether an idle connection is cached for `key`
    pub fn contains(&self, key: &HostKey) -> bool {
        self.lock().idle.contains_key(key)
    }

    /// Get statistics
    pub fn stats(&self) -> PoolStats {
        self.lock().stats
    }

    /// Cached connection count
    pub fn len(&self) -> usize {
        self.lock().idle.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectionPool")
            .field("idle", &inner.idle.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::thread;

    fn stream() -> BufferedConnection<Box<dyn Transport>> {
        let inner: Box<dyn Transport> = Box::new(Cursor::new(Vec::new()));
        BufferedConnection::new(inner)
    }

    #[test]
    fn test_host_key_display() {
        let key = HostKey::new("example.com", 443, true);
        assert_eq!(key.to_string(), "https://example.com:443");
        assert_ne!(key, HostKey::new("example.com", 443, false));
    }

    #[test]
    fn test_connection_pool() {
        let pool = ConnectionPool::new();
        let host = HostKey::new("example.com", 443, true);

        // Nothing cached yet
        assert!(pool.acquire(&host).is_none());

        let conn = pool.register(&host, stream());
        assert_eq!(conn.id, 0);
        assert_eq!(conn.request_count, 1);
        pool.release(conn);
        assert!(pool.contains(&host));

        // Second acquire reuses and checks the connection out
        let conn = pool.acquire(&host).unwrap();
        assert_eq!(conn.id, 0);
        assert_eq!(conn.request_count, 2);
        assert!(!pool.contains(&host));
        assert!(pool.acquire(&host).is_none());

        pool.release(conn);
        let stats = pool.stats();
        assert_eq!(stats.connections_created, 1);
        assert_eq!(stats.connections_reused, 1);
        assert_eq!(stats.reuse_rate(), 0.5);
    }

    #[test]
    fn test_evict() {
        let pool = ConnectionPool::new();
        let host = HostKey::new("example.com", 80, false);

        let conn = pool.register(&host, stream());
        pool.release(conn);

        let conn = pool.acquire(&host).unwrap();
        pool.evict(&host, Some(conn));
        assert!(pool.is_empty());
        assert!(pool.acquire(&host).is_none());
        assert_eq!(pool.stats().connections_closed, 1);
    }

    #[test]
    fn test_evict_removes_cached_entry() {
        let pool = ConnectionPool::new();
        let host = HostKey::new("example.com", 80, false);

        pool.release(pool.register(&host, stream()));
        pool.evict(&host, None);
        assert!(!pool.contains(&host));
    }

    #[test]
    fn test_release_keeps_one_per_endpoint() {
        let pool = ConnectionPool::new();
        let host = HostKey::new("example.com", 80, false);

        let first = pool.register(&host, stream());
        let second = pool.register(&host, stream());
        pool.release(first);
        pool.release(second);

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.acquire(&host).unwrap().id, 1);
        assert_eq!(pool.stats().connections_closed, 1);
    }

    #[test]
    fn test_clear() {
        let pool = ConnectionPool::new();
        pool.release(pool.register(&HostKey::new("a.com", 80, false), stream()));
        pool.release(pool.register(&HostKey::new("b.com", 443, true), stream()));
        assert_eq!(pool.len(), 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.stats().connections_closed, 2);
    }

    #[test]
    fn test_concurrent_checkout_is_exclusive() {
        const WORKERS: usize = 8;
        const ROUNDS: usize = 200;

        let pool = ConnectionPool::new();
        let host = HostKey::new("example.com", 80, false);
        let held = Mutex::new(HashSet::new());

        thread::scope(|s| {
            for worker in 0..WORKERS {
                let (pool, host, held) = (&pool, &host, &held);
                s.spawn(move || {
                    for round in 0..ROUNDS {
                        let conn = match pool.acquire(host) {
                            Some(conn) => conn,
                            None => pool.register(host, stream()),
                        };
                        assert!(
                            held.lock().unwrap().insert(conn.id),
                            "connection {} checked out twice",
                            conn.id
                        );
                        assert!(pool.len() <= 1);
                        held.lock().unwrap().remove(&conn.id);

                        if (worker + round) % 5 == 0 {
                            pool.evict(host, Some(conn));
                        } else {
                            pool.release(conn);
                        }
                        assert!(pool.len() <= 1);
                    }
                });
            }
        });

        // Every connection ever opened is either cached or closed
        let stats = pool.stats();
        assert_eq!(stats.connections_created + stats.connections_reused, (WORKERS * ROUNDS) as u64);
        assert_eq!(stats.connections_created - stats.connections_closed, pool.len() as u64);
    }
}
