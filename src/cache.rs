use crate::config::CacheConfig;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

struct Inner<K, V> {
    store: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

/// Bounded in-memory cache with a fixed time-to-live per entry.
///
/// When full, inserting a new key evicts the oldest entry.
pub struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_size: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    pub fn new(config: &CacheConfig) -> Self {
        tracing::info!(
            "Initializing in-memory cache with max_size: {}, expiration: {}s",
            config.max_size,
            config.expiration
        );
        Self {
            inner: Mutex::new(Inner {
                store: HashMap::new(),
                stats: CacheStats::default(),
            }),
            max_size: config.max_size.max(1) as usize,
            ttl: Duration::from_secs(config.expiration),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        let expired = inner.store.get(key).map(|entry| entry.is_expired(self.ttl));
        let fresh = match expired {
            Some(false) => inner.store.get(key).map(|entry| entry.value.clone()),
            Some(true) => {
                tracing::debug!("Cache entry expired for key: {}", key);
                inner.store.remove(key);
                None
            }
            None => None,
        };

        if fresh.is_some() {
            tracing::debug!("Cache hit for key: {}", key);
            inner.stats.hits += 1;
        } else {
            tracing::debug!("Cache miss for key: {}", key);
            inner.stats.misses += 1;
        }
        fresh
    }

    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.lock();
        if inner.store.len() >= self.max_size && !inner.store.contains_key(&key) {
            let oldest = inner
                .store
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.store.remove(&oldest);
                inner.stats.evictions += 1;
                tracing::debug!("Evicted oldest cache entry: {}", oldest);
            }
        }

        inner.store.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        inner.stats.inserts += 1;
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.lock();
        let before = inner.store.len();
        let ttl = self.ttl;
        inner.store.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - inner.store.len();
        if removed > 0 {
            inner.stats.evictions += removed as u64;
            tracing::debug!("Cleaned up {} expired cache entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}
