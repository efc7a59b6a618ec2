//! Operation-counting store decorator.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use cid::Cid;
use skiplog_types::StoreError;

use crate::BlockStore;

/// Wraps a block store and counts `get` and `put` calls.
///
/// The list engine's fetch-count guarantee (at most `log2(N) + 1` gets per
/// random access on a cold cache) is part of its contract; this decorator
/// is how callers and the test suite observe it.
pub struct CountingStore<S> {
    inner: S,
    gets: AtomicU64,
    puts: AtomicU64,
}

impl<S> CountingStore<S> {
    /// Wraps `inner`, starting both counters at zero.
    pub fn new(inner: S) -> Self {
        Self { inner, gets: AtomicU64::new(0), puts: AtomicU64::new(0) }
    }

    /// Number of `get` calls since creation or the last reset.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Number of `put` calls since creation or the last reset.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Resets both counters to zero.
    pub fn reset(&self) {
        self.gets.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for CountingStore<S> {
    async fn put(&self, bytes: &[u8]) -> Result<Cid, StoreError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.inner.put(bytes).await
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.inner.get(cid).await
    }
}
