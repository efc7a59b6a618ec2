//! Error types for skiplog using snafu.
//!
//! [`ListError`] is the closed set of failures the list engine surfaces;
//! the engine recovers from none of them. [`StoreError`] is the failure
//! contract of block-store adapters, wrapped into `ListError::Store` by
//! the engine. Retry policy belongs to the adapter, never to this layer.

use cid::Cid;
use snafu::{Location, Snafu};

use crate::codec::CodecError;

/// Unified result type for list operations.
pub type Result<T, E = ListError> = std::result::Result<T, E>;

/// Failures surfaced by the list engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ListError {
    /// Operation requires a non-empty list.
    #[snafu(display("list is empty"))]
    Empty,

    /// Requested index does not exist in the list.
    #[snafu(display("index {index} not found (head is at {head})"))]
    NotFound {
        /// The index that was requested.
        index: u64,
        /// The head index at the time of the request.
        head: u64,
    },

    /// A node carried no payload (corrupt store).
    #[snafu(display("node {index} has no value"))]
    EmptyValue {
        /// Index of the valueless node.
        index: u64,
    },

    /// Node bytes do not conform to the wire format (corrupt or alien
    /// store entry).
    #[snafu(display("bad node encoding at {location}: {source}"))]
    BadEncoding {
        /// The underlying codec error.
        source: CodecError,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A traversed node violates the skip-link invariant.
    #[snafu(display("node {index} has no links but is not the first entry"))]
    BadStructure {
        /// Index of the offending node.
        index: u64,
    },

    /// Underlying block-store operation failed.
    #[snafu(display("store error at {location}: {source}"))]
    Store {
        /// The underlying store error.
        source: StoreError,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Cancellation was signalled during a store operation.
    #[snafu(display("operation cancelled"))]
    Cancelled,
}

/// Failures raised by block-store adapters.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// No block exists under the requested CID.
    #[snafu(display("block {cid} not in store"))]
    NotInStore {
        /// The missing content identifier.
        cid: Cid,
    },

    /// The backing store failed (transport, I/O).
    #[snafu(display("store backend: {message}"))]
    Backend {
        /// Description of the failure.
        message: String,
    },
}
