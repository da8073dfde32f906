//! Byte-budgeted in-memory blob store.
//!
//! # Responsibilities
//! - Store payloads under a byte budget, evicting oldest insertions first
//! - Expire entries lazily on read when their TTL has passed
//! - Keep `current_size` equal to the sum of live entry sizes
//!
//! # Design Decisions
//! - Eviction is FIFO by insertion. Reads refresh `created_at` and
//!   `access_count` but never move an entry in the eviction order
//! - Re-inserting a key releases the old entry and takes the newest position
//! - One mutex covers every operation, including the lazy-expiry deletes
//!   performed by `get` and `has`

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;
use indexmap::IndexMap;

/// A cached response body.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Bytes,
    pub content_type: String,
    /// Always `payload.len()`.
    pub size_bytes: u64,
    /// Insertion time, refreshed on every hit.
    pub created_at: Instant,
    /// None = never expires by time.
    pub expires_at: Option<Instant>,
    pub access_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: u64,
    pub max_size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Inner {
    /// Iteration order is insertion order; index 0 is evicted first.
    entries: IndexMap<String, CacheEntry>,
    current_size: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.shift_remove(key)?;
        self.current_size -= entry.size_bytes;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<(String, CacheEntry)> {
        let (key, entry) = self.entries.shift_remove_index(0)?;
        self.current_size -= entry.size_bytes;
        self.evictions += 1;
        Some((key, entry))
    }
}

/// A capacity- and TTL-bounded key → blob store.
#[derive(Debug)]
pub struct BoundedCache {
    max_size: u64,
    inner: Mutex<Inner>,
}

impl BoundedCache {
    /// Create an empty cache holding at most `max_size` payload bytes.
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // No critical section can panic with the bookkeeping half-updated.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `payload` under `key`.
    ///
    /// Returns false (and changes nothing) when the payload alone exceeds the
    /// budget. Otherwise evicts the oldest entries until it fits. A TTL too
    /// large to represent as a deadline never expires.
    pub fn set(
        &self,
        key: impl Into<String>,
        payload: Bytes,
        content_type: impl Into<String>,
        ttl: Option<Duration>,
    ) -> bool {
        let size = payload.len() as u64;
        if size > self.max_size {
            return false;
        }

        let key = key.into();
        let mut inner = self.lock();

        inner.remove(&key);

        while inner.current_size + size > self.max_size {
            match inner.evict_oldest() {
                Some((evicted, entry)) => {
                    tracing::debug!(
                        key = %evicted,
                        size = entry.size_bytes,
                        "Cache entry evicted"
                    );
                }
                None => break,
            }
        }

        let now = Instant::now();
        inner.entries.insert(
            key,
            CacheEntry {
                payload,
                content_type: content_type.into(),
                size_bytes: size,
                created_at: now,
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
                access_count: 1,
            },
        );
        inner.current_size += size;
        true
    }

    /// Look up `key`, dropping it if expired.
    ///
    /// A hit refreshes the entry's timestamp and access count.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        let mut inner = self.lock();

        let expired = match inner.entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(expired) => expired,
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.remove(key);
            inner.misses += 1;
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }

        inner.hits += 1;
        let entry = inner.entries.get_mut(key)?;
        entry.created_at = now;
        entry.access_count += 1;
        Some(entry.clone())
    }

    /// Whether a live entry exists for `key`. Expired entries are dropped.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.entries.get(key).map(|entry| entry.is_expired(now)) {
            None => false,
            Some(true) => {
                inner.remove(key);
                false
            }
            Some(false) => true,
        }
    }

    /// Remove `key` if present.
    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.current_size = 0;
    }

    /// Bytes currently held.
    pub fn size(&self) -> u64 {
        self.lock().current_size
    }

    /// Configured byte budget.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Number of stored entries, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            size_bytes: inner.current_size,
            max_size_bytes: self.max_size,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    #[cfg(test)]
    fn live_bytes(&self) -> u64 {
        self.lock().entries.values().map(|e| e.size_bytes).sum()
    }
}
