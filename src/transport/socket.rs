//! UDP transport.
//!
//! Emulates a broadcast face over unicast UDP: every packet is sent as one
//! [`Frame`] to each configured peer, and every datagram received is handed
//! to the handlers whose prefix matches its name. Delivery is best effort.
//! A datagram the socket cannot take right now is dropped, since the sync
//! protocol recovers through periodic retransmission.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use super::frame::Frame;
use crate::core::{Incoming, ReceiveHandler, Transport, TransportError, lock};
use crate::sync::is_under;

/// Default receive buffer size.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 65535;

type Handlers = Arc<Mutex<Vec<(String, ReceiveHandler)>>>;

/// Transport over a UDP socket and a static peer list.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    peers: Mutex<Vec<SocketAddr>>,
    handlers: Handlers,
    recv_task: JoinHandle<()>,
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("socket", &self.socket)
            .field("peers", &self.peers())
            .field("handlers", &lock(&self.handlers).len())
            .finish()
    }
}

impl UdpTransport {
    /// Bind to `addr` and start receiving.
    ///
    /// Must be called within a tokio runtime.
    pub async fn bind(addr: SocketAddr, peers: Vec<SocketAddr>) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket, peers))
    }

    /// Wrap an existing socket and start receiving.
    ///
    /// Must be called within a tokio runtime.
    pub fn from_socket(socket: UdpSocket, peers: Vec<SocketAddr>) -> Self {
        let socket = Arc::new(socket);
        let handlers: Handlers = Arc::default();
        let recv_task = tokio::spawn(recv_loop(Arc::clone(&socket), Arc::clone(&handlers)));
        Self {
            socket,
            peers: Mutex::new(peers),
            handlers,
            recv_task,
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Add a peer. Duplicates are ignored.
    pub fn add_peer(&self, addr: SocketAddr) {
        let mut peers = lock(&self.peers);
        if !peers.contains(&addr) {
            peers.push(addr);
        }
    }

    /// Current peer list.
    pub fn peers(&self) -> Vec<SocketAddr> {
        lock(&self.peers).clone()
    }
}

impl Transport for UdpTransport {
    fn send(&self, name: &str, payload: Option<&[u8]>) -> Result<(), TransportError> {
        let datagram = Frame::from_parts(name, payload).encode()?;

        let mut failure = None;
        for peer in self.peers() {
            match self.socket.try_send_to(&datagram, peer) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tracing::debug!(%peer, name, "socket busy, dropping datagram");
                }
                Err(e) => {
                    tracing::debug!(%peer, name, error = %e, "send failed");
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(TransportError::Io(e)),
            None => Ok(()),
        }
    }

    fn on_receive(&self, prefix: &str, handler: ReceiveHandler) {
        lock(&self.handlers).push((prefix.to_string(), handler));
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn recv_loop(socket: Arc<UdpSocket>, handlers: Handlers) {
    let mut buf = vec![0u8; DEFAULT_RECV_BUFFER_SIZE];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                tracing::warn!(error = %e, "udp receive failed");
                continue;
            }
        };

        let frame = match Frame::decode(&buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%from, error = %e, "dropping malformed datagram");
                continue;
            }
        };

        let targets: Vec<ReceiveHandler> = lock(&handlers)
            .iter()
            .filter(|(prefix, _)| is_under(prefix, frame.name()))
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        if targets.is_empty() {
            tracing::trace!(%from, name = frame.name(), "no handler for datagram");
            continue;
        }

        let incoming = Incoming::from(frame);
        for handler in targets {
            handler(incoming.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn pair() -> (UdpTransport, UdpTransport) {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), Vec::new())
            .await
            .unwrap();
        let b = UdpTransport::bind(
            "127.0.0.1:0".parse().unwrap(),
            vec![a.local_addr().unwrap()],
        )
        .await
        .unwrap();
        a.add_peer(b.local_addr().unwrap());
        (a, b)
    }

    fn channel_handler() -> (mpsc::UnboundedReceiver<Incoming>, ReceiveHandler) {
        let (tx, rx) = mpsc::unbounded_channel();
        (rx, Arc::new(move |incoming: Incoming| {
            let _ = tx.send(incoming);
        }))
    }

    #[tokio::test]
    async fn test_bind() {
        let (a, b) = pair().await;
        assert_ne!(a.local_addr().unwrap().port(), 0);
        assert_eq!(b.peers(), vec![a.local_addr().unwrap()]);

        // Duplicate peers are ignored
        a.add_peer(b.local_addr().unwrap());
        assert_eq!(a.peers().len(), 1);
    }

    #[tokio::test]
    async fn test_interest_and_data_delivery() {
        let (a, b) = pair().await;
        let (mut rx, handler) = channel_handler();
        b.on_receive("/sync", handler);

        a.send("/sync/1/1-1/5", None).unwrap();
        a.send("/sync/1/1-1/5", Some(b"1-1")).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            first,
            Incoming::Interest {
                name: "/sync/1/1-1/5".to_string()
            }
        );

        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            second,
            Incoming::Data {
                name: "/sync/1/1-1/5".to_string(),
                payload: b"1-1".to_vec()
            }
        );
    }

    #[tokio::test]
    async fn test_unmatched_prefix_not_delivered() {
        let (a, b) = pair().await;
        let (mut rx, handler) = channel_handler();
        b.on_receive("/sync", handler);

        a.send("/other/1", None).unwrap();
        a.send("/sync/2", None).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.name(), "/sync/2");
    }

    #[tokio::test]
    async fn test_oversized_packet_rejected() {
        let (a, _b) = pair().await;
        let payload = vec![0u8; crate::core::MAX_DATAGRAM_SIZE];
        assert!(matches!(
            a.send("/sync/1", Some(&payload)),
            Err(TransportError::Frame(_))
        ));
    }
}
