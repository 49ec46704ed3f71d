//! Dispatch loop
//!
//! Drains the outbound [`PacketQueue`] at most one packet per tick, acks
//! before the sync interest. Every tick re-arms the next one after a
//! randomized packet delay, whether or not anything was sent, so the loop
//! runs for as long as its owner keeps it alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::time::Instant;

use super::name::is_under;
use super::packet::Packet;
use super::pending::PendingInterests;
use super::queue::PacketQueue;
use crate::core::{NodeId, Transport, lock};
use crate::transport::{Jitter, Timer};

/// Self-rescheduling sender draining a [`PacketQueue`] into a transport.
pub struct DispatchLoop<T: Transport> {
    node_id: NodeId,
    sync_prefix: String,
    queue: Arc<PacketQueue>,
    transport: Arc<T>,
    pending: Arc<Mutex<PendingInterests>>,
    jitter: Jitter,
    rng: Mutex<StdRng>,
    timer: Timer,
    ticks: AtomicU64,
}

impl<T: Transport> std::fmt::Debug for DispatchLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLoop")
            .field("node_id", &self.node_id)
            .field("queued", &self.queue.len())
            .field("ticks", &self.ticks())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DispatchLoop<T> {
    /// Create a stopped loop.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: NodeId,
        sync_prefix: impl Into<String>,
        queue: Arc<PacketQueue>,
        transport: Arc<T>,
        pending: Arc<Mutex<PendingInterests>>,
        jitter: Jitter,
        rng: StdRng,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            sync_prefix: sync_prefix.into(),
            queue,
            transport,
            pending,
            jitter,
            rng: Mutex::new(rng),
            timer: Timer::new(runtime),
            ticks: AtomicU64::new(0),
        })
    }

    /// Run the first tick now. Calling again restarts the cadence.
    pub fn start(self: &Arc<Self>) {
        self.tick();
    }

    /// Send at most one packet, expire stale interests and re-arm.
    ///
    /// # Panics
    ///
    /// Panics if a queued ack is named outside the sync prefix. Acks reuse
    /// the name of a received interest that was already validated, so this
    /// only happens on a broken internal invariant.
    pub fn tick(self: &Arc<Self>) {
        if let Some(packet) = self.queue.pop_next() {
            self.transmit(packet);
        }
        self.expire_pending();
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let delay = self.jitter.sample(&mut *lock(&self.rng));
        let this = Arc::downgrade(self);
        self.timer.schedule(delay, move || {
            if let Some(this) = this.upgrade() {
                this.tick();
            }
        });
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn transmit(&self, packet: Packet) {
        match packet {
            Packet::Interest { name } => {
                if !is_under(&self.sync_prefix, &name) {
                    tracing::error!(node = self.node_id, %name, "sync interest outside sync prefix, dropping");
                    return;
                }
                match self.transport.send(&name, None) {
                    Ok(()) => {
                        tracing::trace!(node = self.node_id, %name, "sent sync interest");
                        lock(&self.pending).register(name, Instant::now());
                    }
                    Err(e) => {
                        tracing::warn!(node = self.node_id, %name, error = %e, "failed to send sync interest");
                    }
                }
            }
            Packet::Ack { name, payload } => {
                assert!(
                    is_under(&self.sync_prefix, &name),
                    "ack {name} is outside sync prefix {}",
                    self.sync_prefix
                );
                match self.transport.send(&name, Some(&payload)) {
                    Ok(()) => tracing::trace!(node = self.node_id, %name, "sent sync ack"),
                    Err(e) => {
                        tracing::warn!(node = self.node_id, %name, error = %e, "failed to send sync ack");
                    }
                }
            }
        }
    }

    fn expire_pending(&self) {
        let expired = lock(&self.pending).expire(Instant::now());
        for name in expired {
            tracing::debug!(node = self.node_id, %name, "sync interest timed out");
        }
    }
}
