//! Outbound packets
//!
//! Everything the engine transmits is one of two kinds: a sync interest
//! (state in the name, no body) or an ack (the interest's name plus the
//! responder's encoded vector as body).

use super::codec;
use super::name::SyncName;
use super::vector::VersionVector;

/// An outbound packet waiting in the dispatch queues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Sync interest advertising the sender's vector
    Interest {
        /// Full interest name
        name: String,
    },
    /// Reply to a sync interest
    Ack {
        /// Name of the interest being answered
        name: String,
        /// Encoded vector of the responder
        payload: Vec<u8>,
    },
}

impl Packet {
    /// Build a sync interest from its parsed name
    pub fn interest(name: &SyncName) -> Self {
        Self::Interest {
            name: name.to_string(),
        }
    }

    /// Build an ack answering `interest_name` with `vector`
    pub fn ack(interest_name: impl Into<String>, vector: &VersionVector) -> Self {
        Self::Ack {
            name: interest_name.into(),
            payload: codec::encode_all(vector).into_bytes(),
        }
    }

    /// Packet name
    pub fn name(&self) -> &str {
        match self {
            Self::Interest { name } | Self::Ack { name, .. } => name,
        }
    }

    /// Body, present only on acks
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Interest { .. } => None,
            Self::Ack { payload, .. } => Some(payload),
        }
    }

    /// Check if this is an ack
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack { .. })
    }
}
