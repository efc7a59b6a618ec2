//! Bounded lookup cache for decoded nodes.
//!
//! Keyed by index, valued by `(node, cid)`. The cache is a pure
//! accelerator: nodes are immutable and content-addressed, so any hit is
//! consistent with what a store fetch would produce. Correctness never
//! depends on its contents or capacity.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use skiplog_types::{Cid, Node};

/// Default cache capacity.
///
/// Traversals re-hit both recent queries and the power-of-two backbone,
/// so a small constant covers the hot set for lists well beyond 2^64
/// entries' worth of skip orders.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// LRU cache of decoded nodes, keyed by index.
///
/// Tracks hit/miss counters for observability.
#[derive(Debug)]
pub struct NodeCache {
    entries: Mutex<LruCache<u64, (Node, Cid)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl NodeCache {
    /// Creates a cache holding at most `capacity` nodes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("clamped to at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns a clone of the cached entry, marking it recently used.
    pub fn get(&self, index: u64) -> Option<(Node, Cid)> {
        let mut entries = self.entries.lock();
        match entries.get(&index) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts an entry, evicting the least recently used one if full.
    pub fn insert(&self, index: u64, node: Node, cid: Cid) {
        self.entries.lock().put(index, (node, cid));
    }

    /// Whether an entry for `index` is present (does not touch recency).
    pub fn contains(&self, index: u64) -> bool {
        self.entries.lock().contains(&index)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops all entries; counters are preserved.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns a snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            len: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of cached nodes.
    pub len: usize,
    /// Maximum capacity.
    pub capacity: usize,
    /// Total hits since creation.
    pub hits: u64,
    /// Total misses since creation.
    pub misses: u64,
}
