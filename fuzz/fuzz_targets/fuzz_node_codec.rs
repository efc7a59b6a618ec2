//! Fuzz target for the node codec.
//!
//! Tests that `decode` never panics on arbitrary input, and that any node
//! it accepts re-encodes canonically and decodes back to the same node.
//! Also exercises the payload scanner on the raw input.

#![no_main]

use libfuzzer_sys::fuzz_target;

use skiplog_types::codec;

fuzz_target!(|data: &[u8]| {
    if let Ok(node) = codec::decode(data) {
        let bytes = codec::encode(&node).expect("decoded node must re-encode");
        let roundtrip = codec::decode(&bytes).expect("canonical bytes must decode");
        assert_eq!(roundtrip, node, "node roundtrip mismatch");
    }

    let _ = codec::validate_payload(data);
});
