//! In-process broadcast transport.
//!
//! A [`MemoryHub`] connects any number of [`MemoryTransport`] endpoints as if
//! they shared one multicast face. Every packet is delivered synchronously,
//! on the sender's thread, to every other endpoint that registered a
//! matching prefix. An interest that reaches nobody is answered with a
//! nack to the sender.
//!
//! Loss can be injected with [`MemoryHub::set_drop_filter`], which makes
//! the hub suitable for exercising retransmission in tests and simulations.

use std::sync::{Arc, Mutex};

use crate::core::{Incoming, ReceiveHandler, Transport, TransportError, lock};
use crate::sync::is_under;

/// Endpoint index assigned by the hub, in creation order.
pub type EndpointId = usize;

/// Reason attached to nacks for interests nobody could receive.
pub const NO_ROUTE: &str = "no route";

type DropFilter = Arc<dyn Fn(EndpointId, EndpointId, &Incoming) -> bool + Send + Sync>;

#[derive(Default)]
struct HubState {
    handlers: Vec<(EndpointId, String, ReceiveHandler)>,
    next_id: EndpointId,
    drop_filter: Option<DropFilter>,
}

/// Shared medium connecting memory endpoints.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl std::fmt::Debug for MemoryHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MemoryHub")
            .field("endpoints", &state.next_id)
            .field("handlers", &state.handlers.len())
            .field("lossy", &state.drop_filter.is_some())
            .finish()
    }
}

impl MemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint.
    pub fn endpoint(&self) -> MemoryTransport {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            id
        };
        MemoryTransport {
            id,
            hub: self.clone(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Drop every delivery for which `filter(from, to, packet)` is true.
    pub fn set_drop_filter<F>(&self, filter: F)
    where
        F: Fn(EndpointId, EndpointId, &Incoming) -> bool + Send + Sync + 'static,
    {
        lock(&self.state).drop_filter = Some(Arc::new(filter));
    }

    /// Restore lossless delivery.
    pub fn clear_drop_filter(&self) {
        lock(&self.state).drop_filter = None;
    }

    fn deliver(&self, from: EndpointId, incoming: Incoming) {
        // Handlers run outside the lock: they may send in turn
        let (targets, drop_filter, reachable) = {
            let state = lock(&self.state);
            let matching: Vec<_> = state
                .handlers
                .iter()
                .filter(|(to, prefix, _)| *to != from && is_under(prefix, incoming.name()))
                .map(|(to, _, handler)| (*to, Arc::clone(handler)))
                .collect();
            let reachable = !matching.is_empty();
            (matching, state.drop_filter.clone(), reachable)
        };

        for (to, handler) in targets {
            let dropped = drop_filter
                .as_ref()
                .is_some_and(|filter| filter(from, to, &incoming));
            if dropped {
                tracing::trace!(from, to, name = incoming.name(), "memory hub dropped packet");
                continue;
            }
            handler(incoming.clone());
        }

        if !reachable {
            if let Incoming::Interest { name } = incoming {
                self.nack(from, name);
            }
        }
    }

    fn nack(&self, to: EndpointId, name: String) {
        let handlers: Vec<_> = lock(&self.state)
            .handlers
            .iter()
            .filter(|(id, prefix, _)| *id == to && is_under(prefix, &name))
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(Incoming::Nack {
                name: name.clone(),
                reason: NO_ROUTE.to_string(),
            });
        }
    }
}

/// A packet recorded by [`MemoryTransport::sent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    /// Packet name.
    pub name: String,
    /// Body, `None` for interests.
    pub payload: Option<Vec<u8>>,
}

impl SentPacket {
    /// Check if this was an interest.
    pub fn is_interest(&self) -> bool {
        self.payload.is_none()
    }
}

/// One endpoint on a [`MemoryHub`].
pub struct MemoryTransport {
    id: EndpointId,
    hub: MemoryHub,
    sent: Mutex<Vec<SentPacket>>,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl MemoryTransport {
    /// Endpoint index on the hub.
    pub fn id(&self) -> EndpointId {
        self.id
    }

    /// Every packet sent through this endpoint, oldest first.
    pub fn sent(&self) -> Vec<SentPacket> {
        lock(&self.sent).clone()
    }

    /// Sent interests, oldest first.
    pub fn sent_interests(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter(|packet| packet.is_interest())
            .map(|packet| packet.name.clone())
            .collect()
    }

    /// Forget the send history.
    pub fn clear_sent(&self) {
        lock(&self.sent).clear();
    }
}

impl Transport for MemoryTransport {
    fn send(&self, name: &str, payload: Option<&[u8]>) -> Result<(), TransportError> {
        let packet = SentPacket {
            name: name.to_string(),
            payload: payload.map(<[u8]>::to_vec),
        };
        lock(&self.sent).push(packet.clone());

        let incoming = match packet.payload {
            None => Incoming::Interest { name: packet.name },
            Some(payload) => Incoming::Data {
                name: packet.name,
                payload,
            },
        };
        self.hub.deliver(self.id, incoming);
        Ok(())
    }

    fn on_receive(&self, prefix: &str, handler: ReceiveHandler) {
        lock(&self.hub.state)
            .handlers
            .push((self.id, prefix.to_string(), handler));
    }
}
