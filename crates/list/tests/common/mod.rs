//! Shared helpers for the integration suite.

#![allow(dead_code)]

use skiplog_store::BlockStore;
use skiplog_types::{Cid, Node, codec};
use tokio_util::sync::CancellationToken;

pub fn ctx() -> CancellationToken {
    CancellationToken::new()
}

fn header(buf: &mut Vec<u8>, major: u8, value: u64) {
    let major = major << 5;
    if value < 24 {
        buf.push(major | value as u8);
    } else if value <= u8::MAX as u64 {
        buf.push(major | 24);
        buf.push(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.push(major | 25);
        buf.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        buf.push(major | 26);
        buf.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        buf.push(major | 27);
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

/// CBOR text string payload, as a caller would hand the engine.
pub fn text(s: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(s.len() + 2);
    header(&mut buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
    buf
}

/// CBOR unsigned integer payload.
pub fn uint(n: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(9);
    header(&mut buf, 0, n);
    buf
}

/// CBOR byte string payload.
pub fn bytes_payload(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 3);
    header(&mut buf, 2, data.len() as u64);
    buf.extend_from_slice(data);
    buf
}

/// Fetches and decodes the node stored under `cid`.
pub async fn node_at<S: BlockStore>(store: &S, cid: &Cid) -> Node {
    let bytes = store.get(cid).await.expect("block present");
    codec::decode(&bytes).expect("valid node encoding")
}
