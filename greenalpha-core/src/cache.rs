//! A bounded key/value cache with per-entry TTL and a pluggable eviction
//! policy. Shared by the historical repository and the footprint engine.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvictionPolicy {
    /// Drop the given fraction of capacity, lowest access count first.
    LeastAccessed { fraction: f64 },
    /// Drop the given fraction of capacity, oldest insertion first.
    Oldest { fraction: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl: Duration,
    pub policy: EvictionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl_secs: f64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

pub struct BoundedCache<K, V> {
    settings: CacheSettings,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Expired entries are removed on read and count as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let expired = match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.access_count += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.settings.ttl);
    }

    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.settings.capacity {
            self.evict(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
                access_count: 0,
            },
        );
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits();
        let misses = self.misses();
        let lookups = hits + misses;
        CacheStats {
            size: self.len(),
            capacity: self.settings.capacity,
            ttl_secs: self.settings.ttl.as_secs_f64(),
            hits,
            misses,
            hit_rate: if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 },
        }
    }

    fn evict(&self, entries: &mut HashMap<K, CacheEntry<V>>) {
        let fraction = match self.settings.policy {
            EvictionPolicy::LeastAccessed { fraction } | EvictionPolicy::Oldest { fraction } => fraction,
        };
        let count = ((self.settings.capacity as f64 * fraction) as usize).max(1);

        let mut candidates: Vec<(K, u64, Instant)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.access_count, e.inserted_at))
            .collect();

        match self.settings.policy {
            EvictionPolicy::LeastAccessed { .. } => {
                candidates.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));
            }
            EvictionPolicy::Oldest { .. } => {
                candidates.sort_by(|a, b| a.2.cmp(&b.2));
            }
        }

        for (key, _, _) in candidates.into_iter().take(count) {
            entries.remove(&key);
        }
    }
}
