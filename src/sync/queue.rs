//! Outbound packet queues
//!
//! Two queues shared between every producer (application threads, timer
//! callbacks, receive handlers) and the single dispatch loop:
//!
//! - acks: FIFO, unbounded, never coalesced
//! - sync interest: one slot, every new interest replaces the pending one
//!
//! One mutex guards both. It is held only for the push or pop itself and
//! never across a transport call.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::core::lock;

use super::packet::Packet;

#[derive(Debug, Default)]
struct Queues {
    acks: VecDeque<Packet>,
    sync_interest: Option<Packet>,
}

/// Lock-guarded outbound queues
#[derive(Debug, Default)]
pub struct PacketQueue {
    inner: Mutex<Queues>,
}

impl PacketQueue {
    /// Create empty queues
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        lock(&self.inner)
    }

    /// Append an ack
    pub fn enqueue_ack(&self, packet: Packet) {
        self.lock().acks.push_back(packet);
    }

    /// Replace the pending sync interest
    ///
    /// Returns `true` if an older interest was discarded.
    pub fn enqueue_sync_interest(&self, packet: Packet) -> bool {
        self.lock().sync_interest.replace(packet).is_some()
    }

    /// Pop the next packet to transmit, acks first
    pub fn pop_next(&self) -> Option<Packet> {
        let mut queues = self.lock();
        match queues.acks.pop_front() {
            Some(ack) => Some(ack),
            None => queues.sync_interest.take(),
        }
    }

    /// Number of queued acks
    pub fn pending_acks(&self) -> usize {
        self.lock().acks.len()
    }

    /// Check if a sync interest is waiting
    pub fn has_pending_interest(&self) -> bool {
        self.lock().sync_interest.is_some()
    }

    /// Total queued packets
    pub fn len(&self) -> usize {
        let queues = self.lock();
        queues.acks.len() + usize::from(queues.sync_interest.is_some())
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
