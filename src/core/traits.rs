//! Core traits for SVS sync.
//!
//! The engine never talks to a concrete network. It is written against the
//! [`Transport`] capability and reports to the application through
//! [`MissingDataHandler`].

use std::sync::Arc;

use super::error::TransportError;
use super::types::MissingDataInfo;

/// A packet delivered by a transport to a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A request carrying all of its state in the name.
    Interest {
        /// Full packet name.
        name: String,
    },

    /// A reply to an interest, named after it.
    Data {
        /// Full packet name.
        name: String,
        /// Reply body.
        payload: Vec<u8>,
    },

    /// Negative acknowledgment for an interest we sent.
    Nack {
        /// Name of the interest that was refused.
        name: String,
        /// Reason reported by the transport.
        reason: String,
    },
}

impl Incoming {
    /// Name carried by the packet.
    pub fn name(&self) -> &str {
        match self {
            Self::Interest { name } | Self::Data { name, .. } | Self::Nack { name, .. } => name,
        }
    }
}

/// Handler invoked for every packet under a registered prefix.
pub type ReceiveHandler = Arc<dyn Fn(Incoming) + Send + Sync>;

/// Abstract request/response capability the sync engine runs on.
///
/// # Requirements
///
/// - `send` MUST NOT block; it is called from the dispatch loop.
/// - `send` with `None` emits an interest, with `Some` a data reply.
/// - Handlers MAY be invoked from any thread.
pub trait Transport: Send + Sync + 'static {
    /// Transmit a packet.
    fn send(&self, name: &str, payload: Option<&[u8]>) -> Result<(), TransportError>;

    /// Deliver every packet whose name starts with `prefix` to `handler`.
    fn on_receive(&self, prefix: &str, handler: ReceiveHandler);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, name: &str, payload: Option<&[u8]>) -> Result<(), TransportError> {
        (**self).send(name, payload)
    }

    fn on_receive(&self, prefix: &str, handler: ReceiveHandler) {
        (**self).on_receive(prefix, handler)
    }
}

/// Application boundary notified when a merge discovers missing data.
///
/// Called once per merge with every range that merge produced, in the
/// remote vector's order. Runs synchronously on the caller's thread and
/// MUST NOT block. No engine lock is held during the call.
pub trait MissingDataHandler: Send + Sync + 'static {
    /// Receive the missing ranges of one merge.
    fn on_missing_data(&self, missing: &[MissingDataInfo]);
}

impl<F> MissingDataHandler for F
where
    F: Fn(&[MissingDataInfo]) + Send + Sync + 'static,
{
    fn on_missing_data(&self, missing: &[MissingDataInfo]) {
        self(missing)
    }
}
