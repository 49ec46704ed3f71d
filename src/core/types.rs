//! Identifier and range types shared across layers.

use std::fmt;
use std::ops::RangeInclusive;

/// Identifier of a participant, unique for the session lifetime.
pub type NodeId = u64;

/// Per-node publication sequence number. The first publish is 1.
pub type SeqNo = u64;

/// One contiguous gap discovered for a single remote node during a merge.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MissingDataInfo {
    /// Node whose publications are missing.
    pub node_id: NodeId,
    /// First missing sequence number.
    pub low_seq: SeqNo,
    /// Last missing sequence number.
    pub high_seq: SeqNo,
}

impl MissingDataInfo {
    /// Create a new range.
    pub fn new(node_id: NodeId, low_seq: SeqNo, high_seq: SeqNo) -> Self {
        Self {
            node_id,
            low_seq,
            high_seq,
        }
    }

    /// Sequence numbers covered by this range.
    pub fn seqs(&self) -> RangeInclusive<SeqNo> {
        self.low_seq..=self.high_seq
    }

    /// Number of missing publications.
    pub fn len(&self) -> u64 {
        self.high_seq.saturating_sub(self.low_seq).saturating_add(1)
    }

    /// A range is never empty once produced by a merge.
    pub fn is_empty(&self) -> bool {
        self.high_seq < self.low_seq
    }
}

impl fmt::Display for MissingDataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}..={}]", self.node_id, self.low_seq, self.high_seq)
    }
}
