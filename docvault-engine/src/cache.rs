//! Bounded caching with TTL and pluggable eviction.
//!
//! [`LruCache`] is a generic insertion-ordered cache supporting two eviction
//! strategies (least-recently-used and first-in-first-out), lazy per-entry
//! expiry, an eviction callback, and hit/miss accounting. [`QueryCache`]
//! wraps it for the store: query results keyed by the canonical condition
//! serialization, invalidated wholesale on every mutation.

use indexmap::IndexMap;
use mea::mutex::Mutex;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use docvault_core::document::Document;

/// Callback invoked with each entry evicted by capacity pressure, expiry, or
/// a sweep.
pub type EvictionListener<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// How the cache chooses a victim when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// Every hit re-anchors the entry to the most-recently-used position;
    /// the least recently used entry is evicted first.
    Lru,
    /// Entries keep their insertion order regardless of access; the oldest
    /// insertion is evicted first.
    Fifo,
}

/// Hit/miss accounting for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry).
    pub misses: u64,
    /// Entries currently held, expired-but-unswept ones included.
    pub len: usize,
    /// The configured capacity.
    pub capacity: usize,
}

impl CacheStats {
    /// The fraction of lookups answered from the cache, or 0.0 before any
    /// lookup happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// A bounded, insertion-ordered cache with optional TTL.
///
/// Expiry is evaluated lazily at access time; between accesses, expired
/// entries linger until [`LruCache::sweep_expired`] runs (the store's
/// stay-alive sweeper calls it periodically).
pub struct LruCache<K, V> {
    entries: IndexMap<K, CacheEntry<V>>,
    capacity: usize,
    default_ttl: Option<Duration>,
    strategy: EvictionStrategy,
    on_evict: Option<EvictionListener<K, V>>,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an LRU cache holding at most `capacity` entries (at least one),
    /// with no TTL and no eviction callback.
    pub fn new(capacity: usize) -> Self {
        Self::with_options(capacity, None, EvictionStrategy::Lru, None)
    }

    /// Creates a cache with the full option set.
    pub fn with_options(
        capacity: usize,
        default_ttl: Option<Duration>,
        strategy: EvictionStrategy,
        on_evict: Option<EvictionListener<K, V>>,
    ) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            strategy,
            on_evict,
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up a value, evicting it instead when it has expired. Under the
    /// LRU strategy a hit re-anchors the entry to the most-recently-used
    /// position; FIFO never reorders.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.evict_key(key);
            self.misses += 1;
            return None;
        }
        if self.strategy == EvictionStrategy::Lru {
            self.reanchor(key);
        }
        self.hits += 1;
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Inserts or updates a value under the default TTL.
    pub fn put(&mut self, key: K, value: V) {
        self.put_with_ttl(key, value, None);
    }

    /// Inserts or updates a value, overriding the default TTL for this entry
    /// when `ttl` is given. When the cache is full and the key is new, the
    /// strategy's oldest entry is evicted and the eviction callback invoked.
    pub fn put_with_ttl(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.or(self.default_ttl).map(|ttl| Instant::now() + ttl);
        if self.entries.contains_key(&key) {
            match self.strategy {
                EvictionStrategy::Lru => {
                    self.entries.shift_remove(&key);
                    self.entries.insert(key, CacheEntry { value, expires_at });
                }
                EvictionStrategy::Fifo => {
                    if let Some(entry) = self.entries.get_mut(&key) {
                        entry.value = value;
                        entry.expires_at = expires_at;
                    }
                }
            }
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// True when the key is present and unexpired. Touches neither the
    /// counters nor the access order.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Removes an entry, returning its value. The eviction callback is not
    /// invoked for explicit removals.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key).map(|entry| entry.value)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of entries held, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts every expired entry, invoking the eviction callback for each.
    /// Returns the number of entries swept.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.evict_key(key);
        }
        expired.len()
    }

    /// A point-in-time view of the hit/miss counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.len(),
            capacity: self.capacity,
        }
    }

    fn reanchor(&mut self, key: &K) {
        if let Some((key, entry)) = self.entries.shift_remove_entry(key) {
            self.entries.insert(key, entry);
        }
    }

    fn evict_key(&mut self, key: &K) {
        if let Some((key, entry)) = self.entries.shift_remove_entry(key) {
            if let Some(listener) = self.on_evict.as_mut() {
                listener(&key, &entry.value);
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((key, entry)) = self.entries.shift_remove_index(0) {
            if let Some(listener) = self.on_evict.as_mut() {
                listener(&key, &entry.value);
            }
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Serializes the unexpired entries as an ordered list of pairs.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Replaces the cache contents with a previously serialized list of
    /// pairs, re-applying the default TTL and the capacity bound.
    pub fn restore(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.entries.clear();
        for (key, value) in entries {
            self.put(key, value);
        }
    }
}

/// Configuration for the store's query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached query results.
    pub capacity: usize,
    /// Default time-to-live for cached results; `None` caches until
    /// invalidation.
    pub ttl: Option<Duration>,
    /// The eviction strategy.
    pub strategy: EvictionStrategy,
    /// When set together with a TTL, a background task periodically sweeps
    /// expired entries instead of leaving expiry purely lazy.
    pub stay_alive: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl: None,
            strategy: EvictionStrategy::Lru,
            stay_alive: false,
        }
    }
}

/// Caches query results for the store, keyed by the canonical serialization
/// of the condition tree.
///
/// Invalidation is coarse: any mutation clears the entire cache, since
/// partial invalidation would require tracking which cached queries are
/// affected by which fields.
pub struct QueryCache<T> {
    inner: Arc<Mutex<LruCache<String, Vec<Document<T>>>>>,
    sweeper: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + 'static> QueryCache<T> {
    /// Creates the cache, spawning the stay-alive sweeper when configured.
    /// The sweeper holds only a weak reference and exits once the cache is
    /// dropped.
    pub fn new(config: CacheConfig) -> Self {
        let inner = Arc::new(Mutex::new(LruCache::with_options(
            config.capacity,
            config.ttl,
            config.strategy,
            None,
        )));
        let sweeper = match (config.stay_alive, config.ttl) {
            (true, Some(ttl)) if !ttl.is_zero() => {
                Some(spawn_sweeper(Arc::downgrade(&inner), ttl))
            }
            _ => None,
        };
        Self { inner, sweeper }
    }

    /// Returns the cached result for a query key, if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<Vec<Document<T>>> {
        self.inner.lock().await.get(&key.to_owned()).cloned()
    }

    /// Caches a query result.
    pub async fn put(&self, key: String, documents: Vec<Document<T>>) {
        self.inner.lock().await.put(key, documents);
    }

    /// Clears one entry, or the entire cache when no key is given.
    pub async fn invalidate(&self, key: Option<&str>) {
        let mut cache = self.inner.lock().await;
        match key {
            Some(key) => {
                cache.remove(&key.to_owned());
            }
            None => cache.clear(),
        }
    }

    /// A point-in-time view of the cache counters.
    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}

impl<T> Drop for QueryCache<T> {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
    }
}

fn spawn_sweeper<K, V>(cache: Weak<Mutex<LruCache<K, V>>>, period: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so sweeps start one
        // period from now.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.upgrade() {
                Some(cache) => {
                    let swept = cache.lock().await.sweep_expired();
                    if swept > 0 {
                        log::trace!("swept {swept} expired cache entries");
                    }
                }
                None => break,
            }
        }
    })
}
