//! In-memory recency index: an unbounded LRU map plus byte accounting, with
//! strict dual-budget eviction driven by [`LruIndex::put`].

use lru::LruCache;
use std::num::{NonZeroU64, NonZeroUsize};

/// One resident entry. A `None` value is the tombstone for cached absence.
#[derive(Debug)]
pub(crate) struct IndexEntry<V> {
    pub value: Option<V>,
    pub size: u64,
}

/// Recency-ordered view of the resident entries. The underlying `LruCache` is
/// unbounded; both budgets are enforced here so byte accounting and count
/// stay in one place and evictions can be reported to the caller.
pub(crate) struct LruIndex<V> {
    map: LruCache<String, IndexEntry<V>>,
    count_limit: Option<NonZeroUsize>,
    bytes_limit: Option<NonZeroU64>,
    resident_bytes: u64,
}

impl<V> LruIndex<V> {
    pub fn new(count_limit: Option<NonZeroUsize>, bytes_limit: Option<NonZeroU64>) -> Self {
        Self {
            map: LruCache::unbounded(),
            count_limit,
            bytes_limit,
            resident_bytes: 0,
        }
    }

    /// Lookup that refreshes recency.
    pub fn get(&mut self, key: &str) -> Option<&IndexEntry<V>> {
        self.map.get(key)
    }

    /// Insert or replace, making the key most recently used, then evict the
    /// oldest entries until both budgets hold again. The newly written key is
    /// never evicted while any other entry remains, so a single value larger
    /// than the whole byte budget stays resident and simply becomes the next
    /// eviction candidate.
    ///
    /// Returns the evicted storage keys so the caller can cascade deletions
    /// to the durable store.
    pub fn put(&mut self, key: String, entry: IndexEntry<V>) -> Vec<String> {
        self.resident_bytes = self.resident_bytes.saturating_add(entry.size);
        if let Some(old) = self.map.put(key, entry) {
            self.resident_bytes = self.resident_bytes.saturating_sub(old.size);
        }
        self.evict_to_budget()
    }

    fn evict_to_budget(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.over_budget() && self.map.len() > 1 {
            let Some((key, entry)) = self.map.pop_lru() else { break };
            self.resident_bytes = self.resident_bytes.saturating_sub(entry.size);
            evicted.push(key);
        }
        evicted
    }

    fn over_budget(&self) -> bool {
        let over_count = self.count_limit.is_some_and(|limit| self.map.len() > limit.get());
        let over_bytes = self.bytes_limit.is_some_and(|limit| self.resident_bytes > limit.get());
        over_count || over_bytes
    }

    pub fn remove(&mut self, key: &str) -> Option<IndexEntry<V>> {
        let entry = self.map.pop(key)?;
        self.resident_bytes = self.resident_bytes.saturating_sub(entry.size);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.resident_bytes = 0;
    }

    /// Presence check that leaves recency untouched.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }

    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes
    }
}
