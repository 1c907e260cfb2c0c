//! Bounded in-memory cache with FIFO eviction.

use super::{now_secs, Cache, CacheEntry};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    // Insertion order, oldest first. Reads never reorder it.
    order: VecDeque<String>,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
    }
}

/// In-memory [`Cache`] holding at most `max_entries` responses.
///
/// When a new key arrives at capacity the oldest-inserted key is evicted.
/// Replacing an existing key keeps its place in line. Expired entries are
/// purged lazily on lookup.
pub struct MemoryCache {
    inner: RwLock<Inner>,
    max_entries: usize,
}

impl MemoryCache {
    /// Create a cache holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::with_capacity(max_entries),
                order: VecDeque::with_capacity(max_entries),
            }),
            max_entries,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Number of stored entries, including ones that have expired but not
    /// yet been looked up.
    pub fn size(&self) -> usize {
        self.read().entries.len()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.order.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("size", &self.size())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = now_secs();
        {
            let inner = self.read();
            let entry = inner.entries.get(key)?;
            if entry.is_usable(now) {
                return Some(entry.clone());
            }
        }

        // Expired past any stale window. Re-check under the write lock since
        // another caller may have replaced the entry in between.
        let mut inner = self.write();
        if inner.entries.get(key).is_some_and(|e| !e.is_usable(now)) {
            inner.remove(key);
        }
        None
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        if entry.cache_control.no_store || self.max_entries == 0 {
            return;
        }

        let mut inner = self.write();
        if let Some(existing) = inner.entries.get_mut(key) {
            *existing = entry;
            return;
        }

        while inner.entries.len() >= self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }

        inner.order.push_back(key.to_string());
        inner.entries.insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        self.write().remove(key);
    }
}
