//! skiplog-list: a content-addressed, append-only indexed list.
//!
//! Each entry is an immutable DAG-CBOR node in an external block store,
//! holding an opaque payload and skip links to exponentially receding
//! predecessors. Appends assign dense 0-based indices; any prior index is
//! reachable from the head in `O(log N)` block fetches by descending the
//! skip links.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 List engine                  │
//! │   (head ownership, append, get, lookup)      │
//! └──────────┬────────────────────┬──────────────┘
//!            │                    │
//! ┌──────────▼──────────┐  ┌──────▼──────────────┐
//! │     Node cache      │  │     Node codec      │
//! │  (LRU by index)     │  │  (canonical bytes)  │
//! └─────────────────────┘  └──────┬──────────────┘
//!                                 │
//!                   ┌─────────────▼──────────────┐
//!                   │       Block store          │
//!                   │   (put/get by CID)         │
//!                   └────────────────────────────┘
//! ```
//!
//! The engine is single-writer: one logical agent owns the head and
//! appends serially. A frozen list (one that will not be appended to) can
//! be read through `&List` from multiple tasks; the cache is the only
//! shared mutable state and is internally synchronized.
//!
//! # Quick start
//!
//! ```no_run
//! use skiplog_list::List;
//! use skiplog_store::MemoryStore;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> skiplog_types::Result<()> {
//! let ctx = CancellationToken::new();
//! let mut list = List::new(MemoryStore::new());
//!
//! // payloads are opaque CBOR items, encoded by the caller
//! list.append(&ctx, &[0x61, b'a']).await?;
//! list.append(&ctx, &[0x61, b'b']).await?;
//!
//! assert_eq!(list.get(&ctx, 0).await?, vec![0x61, b'a']);
//! assert_eq!(list.head_index()?, 1);
//!
//! // record the head CID to reopen the list later
//! let _head = list.head_cid().expect("non-empty list");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
mod engine;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, NodeCache};
pub use engine::List;

// Re-export the types callers need to use the engine
pub use skiplog_store::BlockStore;
pub use skiplog_types::{Cid, ListError, Node, Result, StoreError};
