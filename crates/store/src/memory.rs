//! In-memory block store for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use cid::Cid;
use parking_lot::RwLock;
use skiplog_types::{StoreError, content_id};

use crate::BlockStore;

/// In-memory block store.
///
/// All blocks are held in memory and lost when the store is dropped.
/// Useful for unit tests, benchmarks, and as the reference semantics a
/// production adapter must match.
#[derive(Default, Debug)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blocks held.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Whether the store holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Whether a block exists under `cid`.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.read().contains_key(cid)
    }

    /// Places `bytes` under an arbitrary CID, bypassing content addressing.
    ///
    /// Fault injection for tests: lets a test serve truncated or otherwise
    /// corrupt bytes for a CID the engine will traverse.
    pub fn insert_unchecked(&self, cid: Cid, bytes: Vec<u8>) {
        self.blocks.write().insert(cid, bytes);
    }

    /// Removes the block under `cid`, if any.
    pub fn remove(&self, cid: &Cid) -> Option<Vec<u8>> {
        self.blocks.write().remove(cid)
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn put(&self, bytes: &[u8]) -> Result<Cid, StoreError> {
        let cid = content_id(bytes);
        self.blocks.write().insert(cid, bytes.to_vec());
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        self.blocks
            .read()
            .get(cid)
            .cloned()
            .ok_or(StoreError::NotInStore { cid: *cid })
    }
}
