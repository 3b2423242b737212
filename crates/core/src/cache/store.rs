//! Bounded in-memory response cache.
//!
//! Entries are keyed by canonical request URL, expire a fixed TTL after
//! insertion and are evicted least-recently-used first once the store is full.
//! LRU order and statistics share one lock.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};

/// A cached response body.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Point-in-time copy of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub last_cleanup: Option<DateTime<Utc>>,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of requests served from cache, 0.0 when nothing was requested.
    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 { 0.0 } else { self.hits as f64 / self.requests as f64 }
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    hits: u64,
    misses: u64,
    last_cleanup: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<String, CacheEntry>,
    counters: Counters,
}

/// Fixed-capacity, time-bounded store for response bytes.
///
/// Shared between callers behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<Inner>,
    ttl: Duration,
    capacity: usize,
}

impl CacheStore {
    /// Create a store holding at most `capacity` entries (minimum 1), each
    /// living `ttl` from insertion.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner { entries: LruCache::new(capacity), counters: Counters::default() }),
            ttl,
            capacity: capacity.get(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entry lifetime applied on insertion.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key, refreshing its LRU position.
    ///
    /// Expired entries are dropped and reported as missing. Counters are not
    /// touched; callers record the logical outcome with [`record_hit`] or
    /// [`record_miss`].
    ///
    /// [`record_hit`]: CacheStore::record_hit
    /// [`record_miss`]: CacheStore::record_miss
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.lock();
        let now = Instant::now();

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            tracing::debug!(key, "dropped expired cache entry");
        }
        None
    }

    /// Insert or replace an entry, evicting the least-recently-used one when full.
    pub fn set(&self, key: impl Into<String>, value: Bytes) {
        let key = key.into();
        let entry = CacheEntry { value, expires_at: Instant::now() + self.ttl };
        let mut inner = self.lock();
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry)
            && evicted != key
        {
            tracing::debug!(evicted = %evicted, "evicted least recently used cache entry");
        }
    }

    /// Remove an entry. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    /// Drop every entry, returning how many were removed. Counters survive.
    pub fn clear_all(&self) -> usize {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }

    /// Drop expired entries and stamp `last_cleanup`. Returns how many were removed.
    pub fn clear_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let stale: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            inner.entries.pop(key);
        }
        inner.counters.last_cleanup = Some(Utc::now());
        stale.len()
    }

    /// Count one request answered from cache.
    pub fn record_hit(&self) {
        let mut inner = self.lock();
        inner.counters.requests += 1;
        inner.counters.hits += 1;
    }

    /// Count one request answered from the network.
    pub fn record_miss(&self) {
        let mut inner = self.lock();
        inner.counters.requests += 1;
        inner.counters.misses += 1;
    }

    /// Number of live and not-yet-swept entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            requests: inner.counters.requests,
            hits: inner.counters.hits,
            misses: inner.counters.misses,
            last_cleanup: inner.counters.last_cleanup,
            entries: inner.entries.len(),
            capacity: self.capacity,
        }
    }
}
