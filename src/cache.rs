//! In-memory TTL cache with hit-count eviction.
//!
//! One instance backs the embedding memo (content hash -> vector) and an
//! optional second instance memoises orchestrated search results. Instances
//! are created once at startup and shared by `Arc`.
//!
//! Eviction is frequency-ranked, not recency-ranked: when the cache is full
//! and a new key arrives, the entry with the fewest hits since insertion is
//! dropped, ties going to the earliest-inserted entry. Expiry is lazy; an
//! entry past its TTL is removed the next time `get` or `has` looks at it.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Default capacity for the embedding cache
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default time-to-live for the embedding cache (2 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// A cached value with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// When this entry was inserted (or last overwritten)
    pub created_at: Instant,
    /// Number of `get` hits since insertion
    pub hit_count: u64,
    /// Insertion order, kept across overwrites; breaks eviction ties
    seq: u64,
}

/// Snapshot of cache size and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held (expired-but-unvisited entries included)
    pub size: usize,
    /// Capacity
    pub max_size: usize,
    /// Time-to-live applied to every entry
    pub ttl: Duration,
    /// Total `get` hits
    pub hits: u64,
    /// Total `get` misses (absent or expired)
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because their TTL had passed
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of `get` calls that hit.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Thread-safe key -> value cache with capacity and TTL bounds.
///
/// Every operation takes the internal lock once, so the
/// capacity-check / evict / insert sequence in [`TtlCache::set`] is atomic
/// with respect to concurrent callers.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_size` entries for `ttl` each.
    ///
    /// A `max_size` of zero is treated as one. A zero `ttl` makes every
    /// entry expire immediately, which effectively disables the cache.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                next_seq: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_size: max_size.max(1),
            ttl,
        }
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) >= self.ttl
    }

    /// Get a cached value, counting a hit on success.
    ///
    /// Expired entries are removed and reported absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.expirations += 1;
            inner.misses += 1;
            trace!(key, "cache entry expired");
            return None;
        }

        let entry = inner.entries.get_mut(key)?;
        entry.hit_count += 1;
        inner.hits += 1;
        Some(entry.value.clone())
    }

    /// Insert or overwrite a value.
    ///
    /// Overwriting keeps the key's insertion position but resets its hit
    /// count and age. Inserting a new key into a full cache first evicts
    /// the entry with the lowest hit count.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.value = value;
            entry.created_at = now;
            entry.hit_count = 0;
            return;
        }

        if inner.entries.len() >= self.max_size {
            if let Some(victim) = eviction_candidate(&inner.entries) {
                inner.entries.remove(&victim);
                inner.evictions += 1;
                trace!(key = %victim, "evicted cache entry");
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                hit_count: 0,
                seq,
            },
        );
    }

    /// Whether a live entry exists for `key`. Does not count as a hit.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => return false,
        };
        if expired {
            inner.entries.remove(key);
            inner.expirations += 1;
            return false;
        }
        true
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Number of entries currently held.
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current size, bounds and counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            ttl: self.ttl,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}

/// Lowest hit count wins; among equals, the earliest insertion.
fn eviction_candidate<V>(entries: &HashMap<String, CacheEntry<V>>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| (entry.hit_count, entry.seq))
        .map(|(key, _)| key.clone())
}
