//! Canonical DAG-CBOR encoding of nodes.
//!
//! A node encodes as a CBOR array of exactly three elements:
//!
//! ```text
//! 83                     -- array(3)
//!   <uint>               -- index, minimum-width argument
//!   <array of links>     -- each link: tag(42) byte-string 0x00 || cid
//!   <value>              -- payload bytes spliced verbatim (one CBOR item)
//! ```
//!
//! The encoder always emits the shortest header form for every integer
//! argument, so identical field values produce identical bytes on every
//! platform. The payload is never re-encoded or interpreted: the decoder
//! scans it only to find its extent and hands the span back untouched.
//! Indefinite-length items are rejected everywhere, as DAG-CBOR requires.
//!
//! A bare CBOR null (`0xf6`) in value position is reserved as the wire
//! marker for an absent payload. A payload consisting of exactly that
//! byte would be indistinguishable from the marker, so the codec rejects
//! it ([`CodecError::NullPayload`]); a null nested inside a larger item
//! is fine. With that single sequence excluded, `decode` is a
//! left-inverse of `encode`: decoding the encoder's output reproduces the
//! node byte-for-byte, including the payload span.

use cid::Cid;
use snafu::Snafu;

use crate::node::{MAX_LINKS, Node};

/// Result type for codec operations.
pub type Result<T, E = CodecError> = std::result::Result<T, E>;

// CBOR major types
const MAJOR_UINT: u8 = 0;
const MAJOR_NEGINT: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const MAJOR_SIMPLE: u8 = 7;

/// CBOR tag marking an IPLD link.
const TAG_CID: u64 = 42;

/// CBOR null (`major 7, value 22`).
const CBOR_NULL: u8 = 0xf6;

/// Errors raised when bytes do not conform to the node wire format.
///
/// Callers wrap these into the engine's `BadEncoding` kind; the distinction
/// between variants is diagnostic only.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CodecError {
    /// Input ended before the item under scan was complete.
    #[snafu(display("unexpected end of input at byte {offset}"))]
    Truncated {
        /// Byte offset where more input was required.
        offset: usize,
    },

    /// A header byte used a reserved or indefinite-length form.
    #[snafu(display("reserved or indefinite-length header byte {byte:#04x} at byte {offset}"))]
    InvalidHeader {
        /// The offending header byte.
        byte: u8,
        /// Byte offset of the header.
        offset: usize,
    },

    /// A field did not carry the major type the schema requires.
    #[snafu(display("expected {expected}, found major type {found} at byte {offset}"))]
    UnexpectedType {
        /// Description of what the schema expects at this position.
        expected: &'static str,
        /// The major type actually found.
        found: u8,
        /// Byte offset of the header.
        offset: usize,
    },

    /// The top-level array did not have exactly three fields.
    #[snafu(display("node must encode exactly 3 fields, found {arity}"))]
    WrongArity {
        /// Number of fields found.
        arity: u64,
    },

    /// The link array exceeded the safety bound.
    #[snafu(display("node carries {count} links (limit {MAX_LINKS})"))]
    TooManyLinks {
        /// Number of links declared.
        count: u64,
    },

    /// A link was not wrapped in CBOR tag 42.
    #[snafu(display("link {position} is not tagged as a CID"))]
    BadLinkTag {
        /// Zero-based position in the link array.
        position: usize,
    },

    /// A link byte string did not start with the multibase identity prefix.
    #[snafu(display("link {position} lacks the multibase identity prefix"))]
    BadLinkPrefix {
        /// Zero-based position in the link array.
        position: usize,
    },

    /// A link byte string did not hold a parseable CID.
    #[snafu(display("link {position} holds an invalid CID: {source}"))]
    BadLinkCid {
        /// Zero-based position in the link array.
        position: usize,
        /// The underlying CID parse error.
        source: cid::Error,
    },

    /// Bytes remained after the third field.
    #[snafu(display("{count} bytes remain after the node"))]
    TrailingBytes {
        /// Number of excess bytes.
        count: usize,
    },

    /// A declared length does not fit in addressable memory.
    #[snafu(display("declared length {len} overflows"))]
    LengthOverflow {
        /// The declared length.
        len: u64,
    },

    /// The payload was the reserved absent-value marker.
    #[snafu(display("payload is the reserved null marker"))]
    NullPayload,
}

/// Encodes a node into its canonical byte form.
///
/// Total on valid nodes; the failures are a link count beyond
/// [`MAX_LINKS`] and a payload equal to the reserved null marker. An
/// empty payload encodes as CBOR null, the wire form of a valueless node.
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    snafu::ensure!(
        node.links.len() <= MAX_LINKS,
        TooManyLinksSnafu { count: node.links.len() as u64 }
    );
    snafu::ensure!(!is_null_payload(&node.value), NullPayloadSnafu);

    // 1 (array header) + 9 (worst-case index) + rough per-link footprint
    let mut buf = Vec::with_capacity(10 + node.links.len() * 42 + node.value.len().max(1));
    buf.push(0x83);
    write_header(&mut buf, MAJOR_UINT, node.index);
    write_header(&mut buf, MAJOR_ARRAY, node.links.len() as u64);
    for link in &node.links {
        write_link(&mut buf, link);
    }
    if node.value.is_empty() {
        buf.push(CBOR_NULL);
    } else {
        buf.extend_from_slice(&node.value);
    }
    Ok(buf)
}

/// Decodes a node from its canonical byte form.
///
/// Validates the three-field arity, the major type of every field, the
/// tag-42 shape of every link, and that no bytes remain after the payload.
/// The payload span is preserved verbatim; a CBOR null in value position
/// decodes to an empty payload.
pub fn decode(bytes: &[u8]) -> Result<Node> {
    let mut r = Reader::new(bytes);

    let (major, arity) = r.read_header()?;
    snafu::ensure!(
        major == MAJOR_ARRAY,
        UnexpectedTypeSnafu { expected: "node array", found: major, offset: 0usize }
    );
    snafu::ensure!(arity == 3, WrongAritySnafu { arity });

    // field 0: index
    let offset = r.pos;
    let (major, index) = r.read_header()?;
    snafu::ensure!(
        major == MAJOR_UINT,
        UnexpectedTypeSnafu { expected: "unsigned index", found: major, offset }
    );

    // field 1: links
    let offset = r.pos;
    let (major, count) = r.read_header()?;
    snafu::ensure!(
        major == MAJOR_ARRAY,
        UnexpectedTypeSnafu { expected: "link array", found: major, offset }
    );
    snafu::ensure!(count <= MAX_LINKS as u64, TooManyLinksSnafu { count });
    let mut links = Vec::with_capacity(count as usize);
    for position in 0..count as usize {
        links.push(r.read_link(position)?);
    }

    // field 2: value, spliced verbatim
    let start = r.pos;
    let value = if r.peek()? == CBOR_NULL {
        r.pos += 1;
        Vec::new()
    } else {
        r.skip_item()?;
        bytes[start..r.pos].to_vec()
    };

    snafu::ensure!(r.pos == bytes.len(), TrailingBytesSnafu { count: bytes.len() - r.pos });

    Ok(Node { index, links, value })
}

/// Checks that `bytes` form exactly one well-formed CBOR item and are not
/// the reserved null marker.
///
/// Used by the engine to reject payloads that could never be decoded back
/// out of a node. The item is scanned, never interpreted.
pub fn validate_payload(bytes: &[u8]) -> Result<()> {
    snafu::ensure!(!is_null_payload(bytes), NullPayloadSnafu);
    let mut r = Reader::new(bytes);
    r.skip_item()?;
    snafu::ensure!(r.pos == bytes.len(), TrailingBytesSnafu { count: bytes.len() - r.pos });
    Ok(())
}

/// Whether `bytes` are exactly the reserved absent-payload marker.
///
/// A payload equal to this single-byte sequence would be indistinguishable
/// from a valueless node on the wire, so it is rejected before it can be
/// spliced.
pub fn is_null_payload(bytes: &[u8]) -> bool {
    bytes == [CBOR_NULL]
}

/// Writes a CBOR header with the minimum-width argument encoding.
fn write_header(buf: &mut Vec<u8>, major: u8, value: u64) {
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

/// Writes one link: tag 42 wrapping a byte string of `0x00 || cid`.
fn write_link(buf: &mut Vec<u8>, link: &Cid) {
    let cid_bytes = link.to_bytes();
    write_header(buf, MAJOR_TAG, TAG_CID);
    write_header(buf, MAJOR_BYTES, cid_bytes.len() as u64 + 1);
    buf.push(0x00);
    buf.extend_from_slice(&cid_bytes);
}

/// Cursor over the input bytes.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn peek(&self) -> Result<u8> {
        self.buf.get(self.pos).copied().ok_or(CodecError::Truncated { offset: self.pos })
    }

    fn next_byte(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::Truncated { offset: self.pos })?;
        snafu::ensure!(end <= self.buf.len(), TruncatedSnafu { offset: self.buf.len() });
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads one header, returning `(major type, argument)`.
    ///
    /// Rejects the reserved argument forms 28-30 and the indefinite-length
    /// form 31. For major type 7 the argument bytes are the simple/float
    /// payload itself, which a scan treats the same way.
    fn read_header(&mut self) -> Result<(u8, u64)> {
        let offset = self.pos;
        let byte = self.next_byte()?;
        let major = byte >> 5;
        let info = byte & 0x1f;
        let arg = match info {
            0..=23 => info as u64,
            24 => self.next_byte()? as u64,
            25 => u16::from_be_bytes(self.take(2)?.try_into().expect("2-byte slice")) as u64,
            26 => u32::from_be_bytes(self.take(4)?.try_into().expect("4-byte slice")) as u64,
            27 => u64::from_be_bytes(self.take(8)?.try_into().expect("8-byte slice")),
            _ => return InvalidHeaderSnafu { byte, offset }.fail(),
        };
        Ok((major, arg))
    }

    /// Reads one link: tag 42, byte string, identity prefix, CID bytes.
    fn read_link(&mut self, position: usize) -> Result<Cid> {
        let (major, tag) = self.read_header()?;
        snafu::ensure!(major == MAJOR_TAG && tag == TAG_CID, BadLinkTagSnafu { position });

        let (major, len) = self.read_header()?;
        snafu::ensure!(major == MAJOR_BYTES, BadLinkTagSnafu { position });
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow { len })?;
        let body = self.take(len)?;
        snafu::ensure!(body.first() == Some(&0x00), BadLinkPrefixSnafu { position });
        Cid::try_from(&body[1..]).map_err(|source| CodecError::BadLinkCid { position, source })
    }

    /// Advances past exactly one CBOR item, without interpreting it.
    ///
    /// Count-based: `pending` holds the number of items still owed. A byte
    /// or text string consumes its body; arrays, maps and tags add to the
    /// debt. Bounded by the input length, so corrupt data cannot loop.
    fn skip_item(&mut self) -> Result<()> {
        let mut pending: u64 = 1;
        while pending > 0 {
            pending -= 1;
            let (major, arg) = self.read_header()?;
            match major {
                MAJOR_UINT | MAJOR_NEGINT | MAJOR_SIMPLE => {}
                MAJOR_BYTES | MAJOR_TEXT => {
                    let len =
                        usize::try_from(arg).map_err(|_| CodecError::LengthOverflow { len: arg })?;
                    self.take(len)?;
                }
                MAJOR_ARRAY => {
                    pending = pending
                        .checked_add(arg)
                        .ok_or(CodecError::LengthOverflow { len: arg })?;
                }
                MAJOR_MAP => {
                    let entries =
                        arg.checked_mul(2).ok_or(CodecError::LengthOverflow { len: arg })?;
                    pending = pending
                        .checked_add(entries)
                        .ok_or(CodecError::LengthOverflow { len: arg })?;
                }
                MAJOR_TAG => pending += 1,
                _ => unreachable!("major type is a 3-bit field"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hash::content_id;

    fn cid_for(data: &[u8]) -> Cid {
        content_id(data)
    }

    /// CBOR text string payload, as a caller would supply it.
    fn text(s: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        write_header(&mut buf, MAJOR_TEXT, s.len() as u64);
        buf.extend_from_slice(s.as_bytes());
        buf
    }

    fn sample_node() -> Node {
        Node {
            index: 2,
            links: vec![cid_for(b"one"), cid_for(b"zero")],
            value: text("two"),
        }
    }

    #[test]
    fn test_roundtrip_sample() {
        let node = sample_node();
        let bytes = encode(&node).unwrap();
        assert_eq!(decode(&bytes).unwrap(), node);
    }

    #[test]
    fn test_roundtrip_genesis() {
        let node = Node { index: 0, links: vec![], value: text("zero") };
        let bytes = encode(&node).unwrap();
        assert_eq!(decode(&bytes).unwrap(), node);
    }

    #[test]
    fn test_encoding_layout() {
        let node = sample_node();
        let bytes = encode(&node).unwrap();

        // array(3), index 2 inline
        assert_eq!(bytes[0], 0x83);
        assert_eq!(bytes[1], 0x02);
        // array(2) of links, then tag 42 on the first link
        assert_eq!(bytes[2], 0x82);
        assert_eq!(&bytes[3..5], &[0xd8, 0x2a]);
        // value spliced verbatim at the tail
        assert_eq!(&bytes[bytes.len() - 4..], &text("two")[..]);
    }

    #[test]
    fn test_link_byte_string_carries_identity_prefix() {
        let link = cid_for(b"target");
        let node = Node { index: 1, links: vec![link], value: text("x") };
        let bytes = encode(&node).unwrap();

        // tag 42 header (2 bytes) then the byte-string header, then 0x00
        let tag_at = 3;
        assert_eq!(&bytes[tag_at..tag_at + 2], &[0xd8, 0x2a]);
        let bs_header = bytes[tag_at + 2];
        assert_eq!(bs_header >> 5, MAJOR_BYTES);
        assert_eq!(bytes[tag_at + 4], 0x00);
    }

    #[test]
    fn test_minimum_width_index_boundaries() {
        for (index, header_len) in
            [(0u64, 1), (23, 1), (24, 2), (255, 2), (256, 3), (65535, 3), (65536, 5), (u32::MAX as u64, 5), (u32::MAX as u64 + 1, 9), (u64::MAX, 9)]
        {
            let node = Node { index, links: vec![], value: text("v") };
            let bytes = encode(&node).unwrap();
            // byte 0 is the array header; the index header follows
            let links_header_at = 1 + header_len;
            assert_eq!(
                bytes[links_header_at] >> 5,
                MAJOR_ARRAY,
                "index {index} should take {header_len} header bytes"
            );
            assert_eq!(decode(&bytes).unwrap().index, index);
        }
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        // array(2) instead of array(3)
        let mut bytes = encode(&sample_node()).unwrap();
        bytes[0] = 0x82;
        assert!(matches!(decode(&bytes), Err(CodecError::WrongArity { arity: 2 })));
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(matches!(
            decode(&[0x02]),
            Err(CodecError::UnexpectedType { expected: "node array", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncation_everywhere() {
        let bytes = encode(&sample_node()).unwrap();
        for cut in 0..bytes.len() {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, CodecError::Truncated { .. }),
                "cut at {cut} produced {err:?}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode(&sample_node()).unwrap();
        bytes.push(0x00);
        assert!(matches!(decode(&bytes), Err(CodecError::TrailingBytes { count: 1 })));
    }

    #[test]
    fn test_decode_rejects_untagged_link() {
        let node = Node { index: 1, links: vec![cid_for(b"x")], value: text("v") };
        let mut bytes = encode(&node).unwrap();
        // overwrite the tag 42 header with tag 43
        assert_eq!(&bytes[3..5], &[0xd8, 0x2a]);
        bytes[4] = 0x2b;
        assert!(matches!(decode(&bytes), Err(CodecError::BadLinkTag { position: 0 })));
    }

    #[test]
    fn test_decode_rejects_missing_identity_prefix() {
        let node = Node { index: 1, links: vec![cid_for(b"x")], value: text("v") };
        let mut bytes = encode(&node).unwrap();
        // tag (2 bytes) + byte-string header (2 bytes) put the prefix at 7
        assert_eq!(bytes[7], 0x00);
        bytes[7] = 0x01;
        assert!(matches!(decode(&bytes), Err(CodecError::BadLinkPrefix { position: 0 })));
    }

    #[test]
    fn test_decode_rejects_indefinite_length() {
        // 0x9f: indefinite-length array
        assert!(matches!(decode(&[0x9f]), Err(CodecError::InvalidHeader { byte: 0x9f, .. })));
    }

    #[test]
    fn test_null_value_decodes_to_empty_payload() {
        let node = Node { index: 0, links: vec![], value: Vec::new() };
        let bytes = encode(&node).unwrap();
        assert_eq!(*bytes.last().unwrap(), CBOR_NULL);
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn test_nested_payload_spliced_verbatim() {
        // payload: [1, {"k": h'00'}, "s"] exercises arrays, maps, tags-free nesting
        let payload = vec![
            0x83, // array(3)
            0x01, // 1
            0xa1, 0x61, b'k', 0x41, 0x00, // {"k": h'00'}
            0x61, b's', // "s"
        ];
        let node = Node { index: 5, links: vec![cid_for(b"p")], value: payload.clone() };
        let bytes = encode(&node).unwrap();
        assert_eq!(decode(&bytes).unwrap().value, payload);
    }

    #[test]
    fn test_validate_payload() {
        assert!(validate_payload(&text("ok")).is_ok());
        assert!(validate_payload(&[0x83, 0x01, 0x02, 0x03]).is_ok());
        // truncated array
        assert!(matches!(
            validate_payload(&[0x83, 0x01]),
            Err(CodecError::Truncated { .. })
        ));
        // two items
        assert!(matches!(
            validate_payload(&[0x01, 0x02]),
            Err(CodecError::TrailingBytes { count: 1 })
        ));
        // empty input
        assert!(matches!(validate_payload(&[]), Err(CodecError::Truncated { offset: 0 })));
        // a bare null is the absent-value marker, not a payload
        assert!(matches!(validate_payload(&[CBOR_NULL]), Err(CodecError::NullPayload)));
    }

    #[test]
    fn test_bare_null_payload_rejected_on_encode() {
        let node = Node { index: 1, links: vec![cid_for(b"p")], value: vec![CBOR_NULL] };
        assert!(matches!(encode(&node), Err(CodecError::NullPayload)));
    }

    #[test]
    fn test_payload_containing_null_roundtrips() {
        // [null] — the null byte is only reserved as the entire payload
        let payload = vec![0x81, CBOR_NULL];
        assert!(validate_payload(&payload).is_ok());
        let node = Node { index: 3, links: vec![cid_for(b"q")], value: payload.clone() };
        let bytes = encode(&node).unwrap();
        assert_eq!(decode(&bytes).unwrap().value, payload);
    }

    #[test]
    fn test_encode_rejects_excess_links() {
        let node = Node {
            index: 1,
            links: vec![cid_for(b"l"); MAX_LINKS + 1],
            value: text("v"),
        };
        assert!(matches!(encode(&node), Err(CodecError::TooManyLinks { .. })));
    }

    #[test]
    fn test_content_id_stable_for_identical_nodes() {
        let a = encode(&sample_node()).unwrap();
        let b = encode(&sample_node()).unwrap();
        assert_eq!(a, b);
        assert_eq!(content_id(&a), content_id(&b));
    }

    mod proptest_codec {
        use proptest::prelude::*;

        use super::*;

        /// Arbitrary payloads as CBOR byte strings wrapping random bytes.
        fn arb_payload() -> impl Strategy<Value = Vec<u8>> {
            proptest::collection::vec(any::<u8>(), 0..128).prop_map(|data| {
                let mut buf = Vec::with_capacity(data.len() + 3);
                write_header(&mut buf, MAJOR_BYTES, data.len() as u64);
                buf.extend_from_slice(&data);
                buf
            })
        }

        fn arb_links() -> impl Strategy<Value = Vec<Cid>> {
            proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 1..32).prop_map(|d| cid_for(&d)),
                0..8,
            )
        }

        proptest! {
            /// decode is a left-inverse of encode.
            #[test]
            fn prop_roundtrip(index in any::<u64>(), links in arb_links(), value in arb_payload()) {
                let node = Node { index, links, value };
                let bytes = encode(&node).unwrap();
                prop_assert_eq!(decode(&bytes).unwrap(), node);
            }

            /// Decoding never panics on arbitrary input.
            #[test]
            fn prop_decode_total(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
                let _ = decode(&bytes);
            }
        }
    }
}
