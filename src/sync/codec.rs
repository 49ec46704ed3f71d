//! Version vector codec
//!
//! Textual encoding used both inside sync interest names and in ack bodies.
//!
//! Format:
//! ```text
//! <node>-<seq>_<node>-<seq>_...
//! ```
//!
//! Entries are written in ascending node order and every number is a
//! canonical unsigned decimal. Decoding rejects anything else, so a string
//! that decodes successfully re-encodes to itself. The empty vector encodes
//! to the empty string.

use std::collections::BTreeSet;

use crate::core::{CodecError, NodeId, SeqNo, VECTOR_ENTRY_SEPARATOR, VECTOR_PAIR_SEPARATOR};

use super::vector::VersionVector;

/// Encode the entries of `vector` whose node passes `filter`.
pub fn encode<F>(vector: &VersionVector, filter: F) -> String
where
    F: Fn(NodeId) -> bool,
{
    let mut out = String::new();
    for (node, seq) in vector.iter().filter(|&(node, _)| filter(node)) {
        if !out.is_empty() {
            out.push(VECTOR_ENTRY_SEPARATOR);
        }
        out.push_str(&node.to_string());
        out.push(VECTOR_PAIR_SEPARATOR);
        out.push_str(&seq.to_string());
    }
    out
}

/// Encode every entry of `vector`.
pub fn encode_all(vector: &VersionVector) -> String {
    encode(vector, |_| true)
}

/// Decode an encoded vector, returning it with the set of nodes it named.
pub fn decode(encoded: &str) -> Result<(VersionVector, BTreeSet<NodeId>), CodecError> {
    let mut vector = VersionVector::new();
    let mut included = BTreeSet::new();

    if encoded.is_empty() {
        return Ok((vector, included));
    }

    let mut previous: Option<NodeId> = None;
    for (position, entry) in encoded.split(VECTOR_ENTRY_SEPARATOR).enumerate() {
        if entry.is_empty() {
            return Err(CodecError::EmptyEntry(position));
        }

        let (node, seq) = entry
            .split_once(VECTOR_PAIR_SEPARATOR)
            .ok_or_else(|| CodecError::MalformedEntry(entry.to_string()))?;
        let node: NodeId = parse_canonical(node)?;
        let seq: SeqNo = parse_canonical(seq)?;

        if let Some(previous) = previous {
            if node <= previous {
                return Err(CodecError::OutOfOrder { node, previous });
            }
        }
        previous = Some(node);

        vector.observe(node, seq);
        included.insert(node);
    }

    Ok((vector, included))
}

/// Decode an ack body.
pub fn decode_bytes(payload: &[u8]) -> Result<(VersionVector, BTreeSet<NodeId>), CodecError> {
    let encoded = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
    decode(encoded)
}

fn parse_canonical(digits: &str) -> Result<u64, CodecError> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if !canonical {
        return Err(CodecError::InvalidNumber(digits.to_string()));
    }
    digits
        .parse()
        .map_err(|_| CodecError::InvalidNumber(digits.to_string()))
}
