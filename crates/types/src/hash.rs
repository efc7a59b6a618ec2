//! Content addressing for skiplog nodes.
//!
//! Every node is identified by the CID of its canonical encoding:
//! CIDv1, dag-cbor codec (`0x71`), BLAKE2b-256 multihash (`0xb220`).
//! This prefix is a compatibility parameter: changing any component of it
//! changes every CID and breaks interchange with previously written data.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use cid::Cid;
use cid::multihash::Multihash;

/// BLAKE2b with a 256-bit digest.
type Blake2b256 = Blake2b<U32>;

/// Multicodec code for the DAG-CBOR block format.
pub const DAG_CBOR: u64 = 0x71;

/// Multihash code for BLAKE2b-256.
pub const BLAKE2B_256: u64 = 0xb220;

/// Digest length in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Computes the content identifier of an encoded block.
///
/// This is the single derivation rule shared by the node codec and every
/// store backend. Equal bytes always yield equal CIDs.
pub fn content_id(bytes: &[u8]) -> Cid {
    let digest = Blake2b256::digest(bytes);
    // wrap only fails for digests longer than 64 bytes; ours is fixed at 32
    let hash =
        Multihash::wrap(BLAKE2B_256, digest.as_slice()).expect("32-byte digest fits the multihash");
    Cid::new_v1(DAG_CBOR, hash)
}
