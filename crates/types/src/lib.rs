//! skiplog-types: foundational types for the skiplog append-only list.
//!
//! This crate provides everything below the list engine:
//! - The [`Node`] data model with its skip-link shape helpers
//! - The canonical DAG-CBOR codec ([`codec`]) that defines the wire format
//! - Content addressing ([`hash`]): CIDv1 / dag-cbor / BLAKE2b-256
//! - Error types using snafu ([`error`])
//!
//! The wire format is the external contract of the system: two independent
//! implementations must produce byte-identical encodings for identical
//! logical nodes, or they derive different CIDs and cannot share a store.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod node;

// Re-export commonly used types at crate root
pub use cid::Cid;
pub use error::{ListError, Result, StoreError};
pub use hash::content_id;
pub use node::{MAX_LINKS, Node};
