use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::error::CacheResult;
use crate::traits::CacheStore;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// In-memory, HashMap-based cache store with optional per-entry TTL.
///
/// Intended for tests and single-process embedding. Expired entries are
/// dropped lazily on access or by [`Self::purge_expired`].
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently held, including not-yet-purged expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Returns `true` if a live entry exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.live_value(key, Instant::now()).is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut map = self.entries.write().expect("lock poisoned");
        let before = map.len();
        map.retain(|_, entry| entry.is_live(now));
        before - map.len()
    }

    fn live_value(&self, key: &str, now: Instant) -> Option<Vec<u8>> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Vec<u8>> {
        if let Some(value) = self.live_value(key, now) {
            return Some(value);
        }
        let mut map = self.entries.write().expect("lock poisoned");
        if map.get(key).is_some_and(|entry| !entry.is_live(now)) {
            map.remove(key);
        }
        None
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.get_at(key, Instant::now()))
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some_and(|entry| entry.is_live(now)))
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.write().expect("lock poisoned").clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
