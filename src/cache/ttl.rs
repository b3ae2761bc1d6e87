//! In-memory cache with a fixed time-to-live
//!
//! Entries are timestamped on `set` and checked on read. There is no background
//! sweep: an expired entry is removed the next time `get` looks at it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};

/// A stored payload and the moment it was captured
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    captured_at: DateTime<Utc>,
}

/// Result of a fallback read, including metadata about cache freshness
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData<V> {
    /// The cached payload
    pub data: V,
    /// When the payload was stored
    pub cached_at: DateTime<Utc>,
    /// Whether the entry is past its TTL
    pub is_expired: bool,
}

/// Keyed cache whose entries go stale after a fixed TTL
///
/// An entry is fresh while `now - captured_at <= ttl` and expired afterwards.
/// All access goes through one mutex, so the read-then-evict step of [`get`]
/// is atomic even when the cache is shared between threads.
///
/// [`get`]: TtlCache::get
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache that timestamps entries with the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates a cache with an injected clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// The time-to-live applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `payload` under `key`, replacing whatever was there
    pub fn set(&self, key: &str, payload: V) {
        let entry = CacheEntry {
            payload,
            captured_at: self.clock.now(),
        };
        self.entries.lock().insert(key.to_string(), entry);
    }

    /// Returns the payload for `key` if it is still fresh
    ///
    /// An expired entry is removed before returning `None`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let fresh = self.is_fresh(entries.get(key)?, now);
        if fresh {
            return entries.get(key).map(|entry| entry.payload.clone());
        }

        entries.remove(key);
        debug!("cache entry '{}' expired and was evicted", key);
        None
    }

    /// Whether `get` would currently return a payload for `key`
    ///
    /// Never evicts.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| self.is_fresh(entry, now))
    }

    /// Returns the payload for `key` regardless of age
    ///
    /// Used when the remote source is unavailable and stale data beats no
    /// data. Never evicts.
    pub fn peek(&self, key: &str) -> Option<CachedData<V>> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key)?;

        Some(CachedData {
            data: entry.payload.clone(),
            cached_at: entry.captured_at,
            is_expired: !self.is_fresh(entry, now),
        })
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.captured_at <= self.ttl
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
