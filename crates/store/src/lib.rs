//! skiplog-store: the block-store adapter contract.
//!
//! The list engine performs all of its I/O through [`BlockStore`], a thin
//! contract over an external content-addressed store: `put` bytes and get
//! back their CID, `get` bytes by CID. The store derives CIDs with the
//! same rule as the node codec ([`skiplog_types::content_id`]), so putting
//! identical bytes always yields identical CIDs and concurrent writers can
//! at most duplicate work, never corrupt each other.
//!
//! Two backends ship with the crate:
//! - [`MemoryStore`] — an in-memory reference implementation, the testing
//!   backend behind the same trait a production adapter implements
//! - [`CountingStore`] — a decorator that counts operations, used to
//!   observe the engine's logarithmic fetch guarantee

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod counting;
mod memory;

pub use counting::CountingStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use cid::Cid;
use skiplog_types::StoreError;

/// Contract required from a content-addressed block store.
///
/// Both operations may suspend; they are the only I/O the list engine
/// performs. The store is assumed durable between calls and consistent: a
/// `get` following a successful `put` of the same content returns the
/// same bytes.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Stores a block and returns its content identifier.
    ///
    /// Idempotent: putting identical bytes yields identical CIDs.
    async fn put(&self, bytes: &[u8]) -> Result<Cid, StoreError>;

    /// Retrieves a block previously stored under `cid`.
    ///
    /// Fails with [`StoreError::NotInStore`] when no such block exists.
    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError>;
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    async fn put(&self, bytes: &[u8]) -> Result<Cid, StoreError> {
        (**self).put(bytes).await
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        (**self).get(cid).await
    }
}
