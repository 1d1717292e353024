use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::CacheError;

/// Storage behind a [`CacheStore`](super::CacheStore).
///
/// Implementations may be remote and may fail; the store treats every failure
/// as a miss.
#[async_trait]
pub trait CacheBackend<V>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError>;

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError>;

    fn backend_name(&self) -> &'static str;
}

/// A stored value with its expiry bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
    expires_at: Instant,
    last_used: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    clock: u64,
}

/// In-process backend with TTL expiry and optional LRU capacity.
pub struct MemoryBackend<V> {
    inner: Mutex<Inner<V>>,
    max_entries: Option<usize>,
}

impl<V: Clone + Send + Sync + 'static> MemoryBackend<V> {
    /// Unbounded; expired entries are swept on every insert.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// When `max_entries` is set, inserting past it evicts the least recently used key.
    pub fn with_capacity(max_entries: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                clock: 0,
            }),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let tick = inner.clock;

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_used = tick;
                return Some(entry.value.clone());
            }
            None => return None,
        };
        if expired {
            inner.entries.remove(key);
        }
        None
    }

    fn insert(&self, key: &str, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let tick = inner.clock;

        // Expired entries are never read again unless their key recurs
        inner.entries.retain(|_, entry| !entry.is_expired(now));

        if let Some(limit) = self.max_entries {
            while !inner.entries.contains_key(key) && inner.entries.len() >= limit {
                let Some(oldest) = inner
                    .entries
                    .values()
                    .min_by_key(|entry| entry.last_used)
                    .map(|entry| entry.key.clone())
                else {
                    break;
                };
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value,
                created_at: Utc::now(),
                ttl,
                expires_at: now + ttl,
                last_used: tick,
            },
        );
    }
}

impl<V: Clone + Send + Sync + 'static> Default for MemoryBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> CacheBackend<V> for MemoryBackend<V> {
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
