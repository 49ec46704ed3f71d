//! Sync engine
//!
//! Runs the SVS protocol for one node:
//!
//! - Start: broadcast the local vector, arm the retransmission timer and
//!   start the dispatch loop.
//! - Local publish ([`SyncEngine::do_update`]): bump the local entry and
//!   broadcast at once, without waiting for the retransmission timer.
//! - Incoming interest: merge the sender's vector, then ack immediately
//!   if we know something it does not, or after a suppression delay
//!   otherwise. An identical vector pushes the retransmission timer back;
//!   a newer one is rebroadcast at once.
//! - Incoming ack: merge only.
//! - Retransmission tick: broadcast the local vector and re-arm.
//!
//! Every merge that uncovers missing data reports it to the application
//! through one [`MissingDataHandler`] call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::runtime::Handle;
use tokio::time::Instant;

use super::codec;
use super::config::SyncConfig;
use super::dispatch::DispatchLoop;
use super::name::SyncName;
use super::packet::Packet;
use super::pending::PendingInterests;
use super::queue::PacketQueue;
use super::vector::{MergeOutcome, VersionVector};
use crate::core::{
    Incoming, MissingDataHandler, NodeId, SeqNo, SyncError, Transport, lock,
};
use crate::transport::Timer;

/// Handle to a running SVS node.
///
/// Cheap to clone; every clone drives the same engine. Timer callbacks and
/// transport handlers only hold weak references, so the engine and all its
/// loops stop once the last handle is dropped.
pub struct SyncEngine<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> std::fmt::Debug for SyncEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("node_id", &self.shared.node_id)
            .field("vector", &self.vector())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

struct State {
    vector: VersionVector,
    rng: StdRng,
}

struct Shared<T: Transport> {
    node_id: NodeId,
    config: SyncConfig,
    transport: Arc<T>,
    queue: Arc<PacketQueue>,
    pending: Arc<Mutex<PendingInterests>>,
    dispatch: Arc<DispatchLoop<T>>,
    state: Mutex<State>,
    retx_timer: Timer,
    /// Suppressed acks, at most one per sender
    suppressed_acks: Mutex<HashMap<NodeId, Timer>>,
    on_missing: Box<dyn MissingDataHandler>,
    runtime: Handle,
    started: AtomicBool,
}

impl<T: Transport> SyncEngine<T> {
    /// Create an engine for `node_id`.
    ///
    /// Must be called within a tokio runtime; timers and the dispatch loop
    /// run on it. The local entry starts at 0.
    pub fn new<H>(
        node_id: NodeId,
        config: SyncConfig,
        transport: Arc<T>,
        on_missing: H,
    ) -> Result<Self, SyncError>
    where
        H: MissingDataHandler,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dispatch_rng = StdRng::seed_from_u64(rng.next_u64());

        let queue = Arc::new(PacketQueue::new());
        let pending = Arc::new(Mutex::new(PendingInterests::new(config.interest_lifetime)));
        let dispatch = DispatchLoop::new(
            node_id,
            config.sync_prefix.clone(),
            Arc::clone(&queue),
            Arc::clone(&transport),
            Arc::clone(&pending),
            config.packet_jitter,
            dispatch_rng,
            runtime.clone(),
        );

        let shared = Shared {
            node_id,
            transport,
            queue,
            pending,
            dispatch,
            state: Mutex::new(State {
                vector: VersionVector::with_node(node_id),
                rng,
            }),
            retx_timer: Timer::new(runtime.clone()),
            suppressed_acks: Mutex::new(HashMap::new()),
            on_missing: Box::new(on_missing),
            runtime,
            started: AtomicBool::new(false),
            config,
        };

        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Register for sync traffic and begin broadcasting.
    ///
    /// Only the first call has an effect.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let shared = Arc::downgrade(&self.shared);
        self.shared.transport.on_receive(
            &self.shared.config.sync_prefix,
            Arc::new(move |incoming: Incoming| {
                if let Some(shared) = shared.upgrade() {
                    shared.on_incoming(incoming);
                }
            }),
        );

        self.shared.retx_sync_interest();
        self.shared.dispatch.start();
        tracing::info!(
            node = self.shared.node_id,
            prefix = %self.shared.config.sync_prefix,
            "sync engine started"
        );
    }

    /// Publish one new local item and return its sequence number.
    ///
    /// Safe to call from any thread, including ones outside the runtime.
    pub fn do_update(&self) -> SeqNo {
        let seq = lock(&self.shared.state).vector.bump(self.shared.node_id);
        tracing::debug!(node = self.shared.node_id, seq, "local publish");
        self.shared.send_sync_interest();
        seq
    }

    /// Handle a sync interest by name.
    pub fn on_incoming_interest(&self, name: &str) {
        self.shared.on_sync_interest(name);
    }

    /// Handle a sync ack.
    pub fn on_incoming_ack(&self, name: &str, payload: &[u8]) {
        self.shared.on_sync_ack(name, payload);
    }

    /// Handle a nack for one of our interests. Only logged.
    pub fn on_nack(&self, name: &str, reason: &str) {
        self.shared.on_nack(name, reason);
    }

    /// Local node id
    pub fn node_id(&self) -> NodeId {
        self.shared.node_id
    }

    /// Sequence number of the latest local publish
    pub fn current_seq(&self) -> SeqNo {
        lock(&self.shared.state).vector.get(self.shared.node_id)
    }

    /// Snapshot of the version vector
    pub fn vector(&self) -> VersionVector {
        lock(&self.shared.state).vector.clone()
    }

    /// Engine configuration
    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Check if [`start`](Self::start) has been called
    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::SeqCst)
    }

    /// Acks waiting for the dispatch loop
    pub fn pending_acks(&self) -> usize {
        self.shared.queue.pending_acks()
    }

    /// Smoothed round-trip time of acked interests
    pub fn srtt(&self) -> Option<Duration> {
        lock(&self.shared.pending).srtt()
    }
}

impl<T: Transport> Shared<T> {
    fn on_incoming(self: &Arc<Self>, incoming: Incoming) {
        match incoming {
            Incoming::Interest { name } => self.on_sync_interest(&name),
            Incoming::Data { name, payload } => self.on_sync_ack(&name, &payload),
            Incoming::Nack { name, reason } => self.on_nack(&name, &reason),
        }
    }

    fn on_sync_interest(self: &Arc<Self>, name: &str) {
        let parsed = match SyncName::parse(&self.config.sync_prefix, name) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(node = self.node_id, %name, error = %e, "dropping sync interest with bad name");
                return;
            }
        };
        if parsed.node_id == self.node_id {
            tracing::trace!(node = self.node_id, %name, "ignoring own sync interest");
            return;
        }

        let peer = parsed.node_id;
        let (remote, _) = match codec::decode(&parsed.encoded_vector) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(node = self.node_id, peer, %name, error = %e, "dropping sync interest with bad vector");
                return;
            }
        };

        let outcome = self.merge(&remote);
        tracing::debug!(
            node = self.node_id,
            peer,
            my_vector_newer = outcome.my_vector_newer,
            other_vector_newer = outcome.other_vector_newer,
            "merged sync interest"
        );
        self.notify_missing(&outcome);

        if outcome.my_vector_newer {
            if let Some(timer) = lock(&self.suppressed_acks).remove(&peer) {
                timer.cancel();
            }
            self.send_sync_ack(name);
        } else {
            self.schedule_suppressed_ack(peer, name.to_string());
        }

        if outcome.other_vector_newer {
            self.retx_sync_interest();
        } else if !outcome.my_vector_newer {
            self.schedule_retx();
        }
    }

    fn on_sync_ack(&self, name: &str, payload: &[u8]) {
        match lock(&self.pending).satisfy(name, Instant::now()) {
            Some(rtt) => tracing::trace!(node = self.node_id, %name, ?rtt, "sync interest acked"),
            None => tracing::trace!(node = self.node_id, %name, "ack for unknown interest"),
        }

        let (remote, _) = match codec::decode_bytes(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(node = self.node_id, %name, error = %e, "dropping sync ack with bad vector");
                return;
            }
        };

        let outcome = self.merge(&remote);
        self.notify_missing(&outcome);
    }

    fn on_nack(&self, name: &str, reason: &str) {
        tracing::debug!(node = self.node_id, %name, reason, "sync interest nacked");
    }

    fn merge(&self, remote: &VersionVector) -> MergeOutcome {
        lock(&self.state).vector.merge(remote)
    }

    fn notify_missing(&self, outcome: &MergeOutcome) {
        if !outcome.other_vector_newer {
            return;
        }
        for gap in &outcome.missing {
            tracing::debug!(node = self.node_id, peer = gap.node_id, %gap, "missing data");
        }
        self.on_missing.on_missing_data(&outcome.missing);
    }

    fn send_sync_interest(&self) {
        // Encode and enqueue under one state guard so a racing publish can
        // never leave an older vector in the interest slot
        let state = lock(&self.state);
        let encoded = codec::encode_all(&state.vector);
        let name = SyncName::now(&self.config.sync_prefix, self.node_id, encoded);
        let superseded = self.queue.enqueue_sync_interest(Packet::interest(&name));
        drop(state);
        if superseded {
            tracing::trace!(node = self.node_id, "superseded queued sync interest");
        }
    }

    fn send_sync_ack(&self, interest_name: &str) {
        let packet = Packet::ack(interest_name, &lock(&self.state).vector);
        self.queue.enqueue_ack(packet);
    }

    fn retx_sync_interest(self: &Arc<Self>) {
        self.send_sync_interest();
        self.schedule_retx();
    }

    fn schedule_retx(self: &Arc<Self>) {
        let delay = self.config.retx_jitter.sample(&mut lock(&self.state).rng);
        let shared = Arc::downgrade(self);
        self.retx_timer.schedule(delay, move || {
            if let Some(shared) = shared.upgrade() {
                shared.retx_sync_interest();
            }
        });
    }

    fn schedule_suppressed_ack(self: &Arc<Self>, peer: NodeId, interest_name: String) {
        let delay = self.config.packet_jitter.sample(&mut lock(&self.state).rng);
        let shared = Arc::downgrade(self);

        let mut acks = lock(&self.suppressed_acks);
        let timer = acks
            .entry(peer)
            .or_insert_with(|| Timer::new(self.runtime.clone()));
        timer.schedule(delay, move || {
            if let Some(shared) = shared.upgrade() {
                shared.finish_suppressed_ack(peer);
                shared.send_sync_ack(&interest_name);
            }
        });
    }

    /// Forget the fired timer for `peer` unless it was re-armed meanwhile.
    fn finish_suppressed_ack(&self, peer: NodeId) {
        let mut acks = lock(&self.suppressed_acks);
        if acks.get(&peer).is_some_and(|timer| !timer.is_armed()) {
            acks.remove(&peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MissingDataInfo, SYNC_PREFIX};
    use crate::sync::SyncConfigBuilder;
    use crate::transport::{Jitter, MemoryHub, MemoryTransport};
    use std::sync::OnceLock;

    const PACKET_DELAY: Duration = Duration::from_millis(10);
    const RETX: Duration = Duration::from_millis(1000);

    type Reports = Arc<Mutex<Vec<Vec<MissingDataInfo>>>>;

    struct Harness {
        engine: SyncEngine<MemoryTransport>,
        remote: MemoryTransport,
        heard: Arc<Mutex<Vec<Incoming>>>,
        reports: Reports,
    }

    impl Harness {
        fn new(node: NodeId) -> Self {
            let hub = MemoryHub::new();
            let transport = Arc::new(hub.endpoint());
            let remote = hub.endpoint();

            let heard = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&heard);
            remote.on_receive(
                SYNC_PREFIX,
                Arc::new(move |incoming: Incoming| sink.lock().unwrap().push(incoming)),
            );

            let reports: Reports = Arc::default();
            let sink = Arc::clone(&reports);
            let engine = SyncEngine::new(node, config(), transport, move |missing: &[MissingDataInfo]| {
                sink.lock().unwrap().push(missing.to_vec());
            })
            .unwrap();

            Self {
                engine,
                remote,
                heard,
                reports,
            }
        }

        fn send_interest(&self, sender: NodeId, entries: &[(NodeId, SeqNo)], timestamp: u64) -> String {
            let vector: VersionVector = entries.iter().copied().collect();
            let name = SyncName::new(SYNC_PREFIX, sender, codec::encode_all(&vector), timestamp);
            let name = name.to_string();
            self.remote.send(&name, None).unwrap();
            name
        }

        fn interests(&self) -> Vec<VersionVector> {
            self.heard
                .lock()
                .unwrap()
                .iter()
                .filter_map(|incoming| match incoming {
                    Incoming::Interest { name } => {
                        let parsed = SyncName::parse(SYNC_PREFIX, name).unwrap();
                        Some(codec::decode(&parsed.encoded_vector).unwrap().0)
                    }
                    _ => None,
                })
                .collect()
        }

        fn acks(&self) -> Vec<(String, String)> {
            self.heard
                .lock()
                .unwrap()
                .iter()
                .filter_map(|incoming| match incoming {
                    Incoming::Data { name, payload } => {
                        Some((name.clone(), String::from_utf8(payload.clone()).unwrap()))
                    }
                    _ => None,
                })
                .collect()
        }

        fn reports(&self) -> Vec<Vec<MissingDataInfo>> {
            self.reports.lock().unwrap().clone()
        }
    }

    fn config() -> SyncConfig {
        SyncConfigBuilder::new()
            .retx_jitter(Jitter::fixed(RETX))
            .packet_jitter(Jitter::fixed(PACKET_DELAY))
            .seed(42)
            .build()
            .unwrap()
    }

    fn vv(entries: &[(NodeId, SeqNo)]) -> VersionVector {
        entries.iter().copied().collect()
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn test_new_outside_runtime() {
        let hub = MemoryHub::new();
        let result = SyncEngine::new(1, SyncConfig::default(), Arc::new(hub.endpoint()), |_: &[MissingDataInfo]| {});
        assert!(matches!(result, Err(SyncError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_rejects_bad_config() {
        let hub = MemoryHub::new();
        let config = SyncConfig {
            sync_prefix: "relative".to_string(),
            ..SyncConfig::default()
        };
        let result = SyncEngine::new(1, config, Arc::new(hub.endpoint()), |_: &[MissingDataInfo]| {});
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_broadcasts_once() {
        let h = Harness::new(1);
        assert_eq!(h.engine.vector(), vv(&[(1, 0)]));

        h.engine.start();
        h.engine.start();
        assert!(h.engine.is_started());
        assert_eq!(h.interests(), vec![vv(&[(1, 0)])]);

        // A second registration would double every ack
        h.send_interest(9, &[], 1);
        assert_eq!(h.engine.pending_acks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_do_update_broadcasts_immediately() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(100).await;

        assert_eq!(h.engine.do_update(), 1);
        assert_eq!(h.engine.do_update(), 2);
        assert_eq!(h.engine.current_seq(), 2);

        // Coalesced into one interest carrying the latest vector
        sleep_ms(PACKET_DELAY.as_millis() as u64 + 1).await;
        assert_eq!(h.interests(), vec![vv(&[(1, 0)]), vv(&[(1, 2)])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_interest_ignored() {
        let h = Harness::new(1);
        h.engine.start();

        h.send_interest(1, &[(1, 5)], 1);
        assert_eq!(h.engine.vector(), vv(&[(1, 0)]));
        assert_eq!(h.engine.pending_acks(), 0);

        sleep_ms(50).await;
        assert!(h.acks().is_empty());
        assert!(h.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ahead_acks_immediately() {
        let h = Harness::new(1);
        h.engine.do_update();
        h.engine.do_update();
        h.engine.start();

        let name = h.send_interest(9, &[(1, 0), (9, 0)], 1);
        assert_eq!(h.engine.pending_acks(), 1);

        sleep_ms(PACKET_DELAY.as_millis() as u64 + 1).await;
        assert_eq!(h.acks(), vec![(name, "1-2".to_string())]);
        assert!(h.reports().is_empty());
        // Only the start broadcast, the retransmission timer is untouched
        assert_eq!(h.interests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_behind_rebroadcasts_and_reports() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(1).await;

        h.send_interest(9, &[(1, 0), (9, 3)], 1);
        assert_eq!(h.reports(), vec![vec![MissingDataInfo::new(9, 1, 3)]]);
        assert_eq!(h.engine.vector(), vv(&[(1, 0), (9, 3)]));
        assert_eq!(h.engine.pending_acks(), 0);

        sleep_ms(30).await;
        let interests = h.interests();
        assert_eq!(interests.len(), 2);
        assert_eq!(interests[1], vv(&[(1, 0), (9, 3)]));
        // The suppressed ack still goes out
        assert_eq!(h.acks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_suppresses_ack_and_retransmission() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(600).await;

        let name = h.send_interest(9, &[(1, 0)], 1);
        assert_eq!(h.engine.pending_acks(), 0);

        sleep_ms(25).await;
        assert_eq!(h.acks(), vec![(name, "1-0".to_string())]);

        // Retransmission pushed from 1000 ms to 1600 ms
        sleep_ms(475).await;
        assert_eq!(h.interests().len(), 1);
        sleep_ms(600).await;
        assert_eq!(h.interests().len(), 2);
        assert!(h.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_interest_supersedes_suppressed_ack() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(1).await;

        h.send_interest(9, &[(1, 0)], 1);
        sleep_ms(5).await;
        let second = h.send_interest(9, &[(1, 0)], 2);

        sleep_ms(40).await;
        assert_eq!(h.acks(), vec![(second, "1-0".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppressed_acks_are_per_sender() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(1).await;

        h.send_interest(8, &[(1, 0)], 1);
        h.send_interest(9, &[(1, 0)], 1);

        sleep_ms(40).await;
        assert_eq!(h.acks().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_suppressed_acks_are_forgotten() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(1).await;

        for sender in 100..150 {
            h.send_interest(sender, &[(1, 0)], 1);
        }
        assert_eq!(lock(&h.engine.shared.suppressed_acks).len(), 50);

        sleep_ms(PACKET_DELAY.as_millis() as u64 + 1).await;
        assert!(lock(&h.engine.shared.suppressed_acks).is_empty());

        // Each ack still goes out, one per tick
        sleep_ms(600).await;
        assert_eq!(h.acks().len(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_newer_acks_and_rebroadcasts() {
        let h = Harness::new(1);
        h.engine.start();
        h.engine.do_update();
        h.engine.do_update();
        sleep_ms(100).await;
        let before = h.interests().len();

        let name = h.send_interest(9, &[(9, 3)], 1);
        assert_eq!(h.engine.pending_acks(), 1);
        assert_eq!(h.reports(), vec![vec![MissingDataInfo::new(9, 1, 3)]]);
        assert!(h.engine.shared.queue.has_pending_interest());

        sleep_ms(25).await;
        assert_eq!(h.acks(), vec![(name, "1-2_9-3".to_string())]);
        let interests = h.interests();
        assert_eq!(interests.len(), before + 1);
        assert_eq!(interests.last(), Some(&vv(&[(1, 2), (9, 3)])));

        // Retransmission re-armed from 100 ms, so nothing at 1000 ms
        sleep_ms(925).await;
        assert_eq!(h.interests().len(), before + 1);
        sleep_ms(100).await;
        assert_eq!(h.interests().len(), before + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_ack_cancels_suppressed_ack() {
        let h = Harness::new(1);
        h.engine.start();
        sleep_ms(1).await;

        h.send_interest(9, &[(1, 0)], 1);
        assert_eq!(h.engine.pending_acks(), 0);
        sleep_ms(3).await;

        // The sender lacks our entry, so this one is answered at once
        let second = h.send_interest(9, &[(9, 0)], 2);
        assert_eq!(h.engine.pending_acks(), 1);
        assert!(lock(&h.engine.shared.suppressed_acks).is_empty());

        sleep_ms(40).await;
        assert_eq!(h.acks(), vec![(second, "1-0".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_merges_without_rebroadcast() {
        let h = Harness::new(1);
        h.engine.start();
        let name = match &h.heard.lock().unwrap()[0] {
            Incoming::Interest { name } => name.clone(),
            other => panic!("expected interest, got {other:?}"),
        };

        sleep_ms(4).await;
        h.remote.send(&name, Some(b"1-0_7-1_9-2")).unwrap();

        assert_eq!(
            h.reports(),
            vec![vec![MissingDataInfo::new(7, 1, 1), MissingDataInfo::new(9, 1, 2)]]
        );
        assert_eq!(h.engine.vector(), vv(&[(1, 0), (7, 1), (9, 2)]));
        assert_eq!(h.engine.srtt(), Some(Duration::from_millis(4)));

        sleep_ms(100).await;
        assert_eq!(h.interests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_packets_dropped() {
        let h = Harness::new(1);
        h.engine.start();

        h.remote.send("/ndn/svs/syncNotify/9/9-01/1", None).unwrap();
        h.remote.send("/ndn/svs/syncNotify/nine/9-1/1", None).unwrap();
        h.remote.send("/ndn/svs/syncNotify/9/9-1", None).unwrap();
        h.remote.send("/ndn/svs/syncNotify/9/9-1/1", Some(b"\xff")).unwrap();
        h.remote.send("/ndn/svs/syncNotify/9/9-1/1", Some(b"2-1_1-1")).unwrap();

        assert_eq!(h.engine.vector(), vv(&[(1, 0)]));
        assert_eq!(h.engine.pending_acks(), 0);
        assert!(h.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nack_is_harmless() {
        let hub = MemoryHub::new();
        let engine =
            SyncEngine::new(1, config(), Arc::new(hub.endpoint()), |_: &[MissingDataInfo]| {})
                .unwrap();
        engine.start();

        // Nobody else is on the hub, so every interest is nacked
        sleep_ms(2500).await;
        engine.on_nack("/ndn/svs/syncNotify/1/1-0/0", "no route");
        assert_eq!(engine.vector(), vv(&[(1, 0)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_publish() {
        let hub = MemoryHub::new();
        let remote = hub.endpoint();
        let slot: Arc<OnceLock<SyncEngine<MemoryTransport>>> = Arc::default();

        let inner = Arc::clone(&slot);
        let engine = SyncEngine::new(1, config(), Arc::new(hub.endpoint()), move |_: &[MissingDataInfo]| {
            if let Some(engine) = inner.get() {
                engine.do_update();
            }
        })
        .unwrap();
        slot.set(engine.clone()).unwrap();
        engine.start();

        let name = SyncName::new(SYNC_PREFIX, 9, "9-1".to_string(), 1).to_string();
        remote.send(&name, None).unwrap();

        assert_eq!(engine.current_seq(), 1);
        assert_eq!(engine.vector(), vv(&[(1, 1), (9, 1)]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_do_update_from_other_threads() {
        let h = Harness::new(1);
        h.engine.start();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let engine = h.engine.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        engine.do_update();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(h.engine.current_seq(), 400);
        sleep_ms(PACKET_DELAY.as_millis() as u64 + 1).await;
        assert_eq!(h.interests().last(), Some(&vv(&[(1, 400)])));
    }

    #[tokio::test]
    async fn test_queued_interest_carries_latest_publish() {
        for _ in 0..200 {
            let hub = MemoryHub::new();
            let engine =
                SyncEngine::new(1, config(), Arc::new(hub.endpoint()), |_: &[MissingDataInfo]| {})
                    .unwrap();

            let workers: Vec<_> = (0..4)
                .map(|_| {
                    let engine = engine.clone();
                    std::thread::spawn(move || {
                        for _ in 0..50 {
                            engine.do_update();
                        }
                    })
                })
                .collect();
            for worker in workers {
                worker.join().unwrap();
            }

            let name = match engine.shared.queue.pop_next() {
                Some(Packet::Interest { name }) => name,
                other => panic!("expected queued interest, got {other:?}"),
            };
            let parsed = SyncName::parse(SYNC_PREFIX, &name).unwrap();
            let queued = codec::decode(&parsed.encoded_vector).unwrap().0;
            assert_eq!(queued.get(1), engine.current_seq());
            assert_eq!(engine.current_seq(), 200);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retransmits_periodically() {
        let h = Harness::new(1);
        h.engine.start();

        sleep_ms(3500).await;
        assert_eq!(h.interests().len(), 4);
    }
}
