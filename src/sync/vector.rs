//! Version vector and max-merge
//!
//! A version vector maps every known node to the highest sequence number
//! observed from it. Entries only ever grow: there is no operation that
//! lowers or removes one.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::core::{MissingDataInfo, NodeId, SeqNo};

/// Mapping from node id to the highest known sequence number.
///
/// Iteration is in ascending node id order, which is also the order in
/// which merges report missing ranges and the codec writes entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionVector {
    entries: BTreeMap<NodeId, SeqNo>,
}

/// Result of merging a remote vector into the local one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Local vector held something the remote lacked
    pub my_vector_newer: bool,
    /// Remote vector held something the local lacked
    pub other_vector_newer: bool,
    /// One range per remote node with a gap, in the remote's order
    pub missing: Vec<MissingDataInfo>,
}

impl MergeOutcome {
    /// Both vectors agreed on every node
    pub fn is_identical(&self) -> bool {
        !self.my_vector_newer && !self.other_vector_newer
    }
}

impl VersionVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vector holding a single node at sequence 0
    pub fn with_node(node: NodeId) -> Self {
        let mut vv = Self::new();
        vv.entries.insert(node, 0);
        vv
    }

    /// Sequence number for `node`, 0 when unknown
    pub fn get(&self, node: NodeId) -> SeqNo {
        self.entries.get(&node).copied().unwrap_or(0)
    }

    /// Whether `node` has an entry (possibly 0)
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// Increment the entry for `node` by exactly one and return it
    pub fn bump(&mut self, node: NodeId) -> SeqNo {
        let seq = self.entries.entry(node).or_insert(0);
        *seq = seq.saturating_add(1);
        *seq
    }

    /// Raise the entry for `node` to at least `seq`
    ///
    /// Returns `true` if the entry changed.
    pub fn observe(&mut self, node: NodeId, seq: SeqNo) -> bool {
        match self.entries.entry(node) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(seq);
                true
            }
            btree_map::Entry::Occupied(mut slot) if *slot.get() < seq => {
                slot.insert(seq);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Number of known nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no node is known
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending node order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, SeqNo)> + '_ {
        self.entries.iter().map(|(node, seq)| (*node, *seq))
    }

    /// Known node ids in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    /// Merge `remote` into this vector (pointwise max)
    ///
    /// `my_vector_newer` is judged against the vector as it was before
    /// the merge. Under max-merge the post-merge vector gives the same
    /// answer, since a raised entry equals the remote one.
    pub fn merge(&mut self, remote: &VersionVector) -> MergeOutcome {
        let my_vector_newer = self
            .entries
            .iter()
            .any(|(node, &seq)| remote.entries.get(node).is_none_or(|&theirs| theirs < seq));

        let mut outcome = MergeOutcome {
            my_vector_newer,
            ..MergeOutcome::default()
        };

        for (&node, &remote_seq) in &remote.entries {
            let local_seq = self.get(node);
            if local_seq < remote_seq {
                outcome.other_vector_newer = true;
                outcome
                    .missing
                    .push(MissingDataInfo::new(node, local_seq + 1, remote_seq));
                self.entries.insert(node, remote_seq);
            }
        }

        outcome
    }
}

impl FromIterator<(NodeId, SeqNo)> for VersionVector {
    /// Duplicate nodes keep their highest sequence number.
    fn from_iter<I: IntoIterator<Item = (NodeId, SeqNo)>>(iter: I) -> Self {
        let mut vv = Self::new();
        for (node, seq) in iter {
            vv.observe(node, seq);
        }
        vv
    }
}

impl<'a> IntoIterator for &'a VersionVector {
    type Item = (&'a NodeId, &'a SeqNo);
    type IntoIter = btree_map::Iter<'a, NodeId, SeqNo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
