//! Process-wide response cache.
//!
//! Entries are bounded by an LRU. Every [`ResponseCache::evict_all`] bumps a
//! generation counter; a value computed before an eviction carries the old
//! generation and is refused by [`ResponseCache::put`], so a read that raced
//! a write can never repopulate the cache with pre-write data.

use std::{
    hash::Hash,
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;

struct Entries<K: Hash + Eq, V> {
    map: LruCache<K, V>,
    generation: u64,
}

pub struct ResponseCache<K: Hash + Eq, V> {
    name: &'static str,
    entries: Mutex<Entries<K, V>>,
}

impl<K: Hash + Eq, V: Clone> ResponseCache<K, V> {
    /// A cache holding at most `capacity` entries (at least one)
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            name,
            entries: Mutex::new(Entries {
                map: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    // No invariant spans a panic inside the lock
    fn lock(&self) -> MutexGuard<'_, Entries<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current generation, to be read before computing a value for [`Self::put`]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().map.get(key).cloned()
    }

    /// Store `value` unless the cache was evicted since `generation` was read.
    /// Returns whether the value was stored.
    pub fn put(&self, key: K, value: V, generation: u64) -> bool {
        let mut entries = self.lock();
        if entries.generation != generation {
            return false;
        }
        entries.map.put(key, value);
        true
    }

    /// Drop every entry
    pub fn evict_all(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.generation = entries.generation.wrapping_add(1);
        tracing::debug!(cache = self.name, "Evicted all entries");
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for ResponseCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
