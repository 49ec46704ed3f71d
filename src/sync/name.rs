//! Packet naming
//!
//! Sync interests carry all of their state in the name:
//! ```text
//! <sync prefix>/<sender node>/<encoded vector>/<timestamp ms>
//! ```
//! The timestamp only exists to make retransmitted names unique. Acks reuse
//! the name of the interest they answer.
//!
//! Data names are built for consumers of missing-data notifications:
//! ```text
//! <data prefix>/<node>/<seq>/0
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{DATA_FRAGMENT, NameError, NodeId, SeqNo};

/// Check whether `name` lies under `prefix`, component-wise.
pub fn is_under(prefix: &str, name: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Build the name of one published data object.
pub fn data_name(data_prefix: &str, node: NodeId, seq: SeqNo) -> String {
    format!(
        "{}/{}/{}/{}",
        data_prefix.trim_end_matches('/'),
        node,
        seq,
        DATA_FRAGMENT
    )
}

/// Parsed sync interest name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncName {
    /// Prefix the name was built under.
    pub prefix: String,
    /// Node that emitted the interest.
    pub node_id: NodeId,
    /// Encoded version vector of the sender.
    pub encoded_vector: String,
    /// Milliseconds since the Unix epoch at emission.
    pub timestamp_ms: u64,
}

impl SyncName {
    /// Create a name stamped with the current wall-clock time.
    pub fn now(prefix: &str, node_id: NodeId, encoded_vector: String) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        Self::new(prefix, node_id, encoded_vector, timestamp_ms)
    }

    /// Create a name with an explicit timestamp.
    pub fn new(prefix: &str, node_id: NodeId, encoded_vector: String, timestamp_ms: u64) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            node_id,
            encoded_vector,
            timestamp_ms,
        }
    }

    /// Parse a full name emitted under `prefix`.
    pub fn parse(prefix: &str, name: &str) -> Result<Self, NameError> {
        let prefix = prefix.trim_end_matches('/');
        let rest = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| NameError::WrongPrefix {
                name: name.to_string(),
                prefix: prefix.to_string(),
            })?;

        let mut components = rest.split('/');
        let node = components
            .next()
            .filter(|c| !c.is_empty())
            .ok_or(NameError::MissingComponent("node id"))?;
        let encoded_vector = components
            .next()
            .ok_or(NameError::MissingComponent("vector"))?;
        let timestamp = components
            .next()
            .filter(|c| !c.is_empty())
            .ok_or(NameError::MissingComponent("timestamp"))?;
        if components.next().is_some() {
            return Err(NameError::TrailingComponents);
        }

        let node_id = node
            .parse()
            .map_err(|_| NameError::InvalidNodeId(node.to_string()))?;
        let timestamp_ms = timestamp
            .parse()
            .map_err(|_| NameError::InvalidTimestamp(timestamp.to_string()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            node_id,
            encoded_vector: encoded_vector.to_string(),
            timestamp_ms,
        })
    }
}

impl fmt::Display for SyncName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.prefix, self.node_id, self.encoded_vector, self.timestamp_ms
        )
    }
}
