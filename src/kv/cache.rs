//! Process-local TTL cache fronting the remote store.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;

/// A cached remote read.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    /// Entries are stale once `ttl_seconds` have passed since the fetch.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.fetched_at.checked_add_signed(ttl));
        match expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// Short-TTL key/value cache. Safe for concurrent use.
///
/// Every invalidation bumps a per-key generation. Readers capture the
/// generation before going remote and insert with
/// [`insert_if_generation`](Self::insert_if_generation), so a read that
/// overlaps a write cannot put the old value back.
#[derive(Debug)]
pub struct LocalCache {
    entries: DashMap<String, CacheEntry>,
    generations: DashMap<String, u64>,
    ttl_seconds: u64,
}

impl LocalCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Fresh cached value for `key`. Expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Utc::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        let fresh = {
            let entry = self.entries.get(key)?;
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        };
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.insert_at(key, value, Utc::now());
    }

    pub(crate) fn insert_at(&self, key: &str, value: Value, fetched_at: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value,
                fetched_at,
                ttl_seconds: self.ttl_seconds,
            },
        );
    }

    /// Current generation of `key`. Starts at zero.
    pub fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).map(|g| *g).unwrap_or(0)
    }

    /// Insert only if `key` has not been invalidated since `generation` was
    /// read. Returns whether the value was cached.
    pub fn insert_if_generation(&self, key: &str, value: Value, generation: u64) -> bool {
        // Holding the guard keeps a concurrent invalidate out until the
        // insert is done.
        let current = self.generations.get(key);
        if current.as_deref().copied().unwrap_or(0) != generation {
            return false;
        }
        self.insert(key, value);
        true
    }

    /// Drop the entry for `key`, returning whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut generation = self.generations.entry(key.to_string()).or_insert(0);
        *generation += 1;
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
