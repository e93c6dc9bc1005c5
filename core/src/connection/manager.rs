//! Inbound listener, outbound connects and per-connection receive loops

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{accept_async, client_async, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::connection::registry::{ConnectionId, Direction, Peer, PeerRegistry, Upsert};
use crate::connection::PeerLink;
use crate::protocol::{DeviceType, Envelope};
use crate::session::SessionEvent;
use crate::{Error, Result};

/// How long a WebSocket handshake may take, in either direction
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opposite-direction connections registered closer together than this are
/// treated as one simultaneous open
const SIMULTANEOUS_OPEN_WINDOW: Duration = Duration::from_secs(2);

/// Lifecycle of a connection as seen from this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct Inner {
    registry: PeerRegistry,
    local_device_type: DeviceType,
    max_envelope_size: usize,
    events: mpsc::Sender<SessionEvent>,
    connecting: Mutex<HashSet<String>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

/// Owns every live peer socket.
///
/// Cheap to clone; all clones share one registry and one shutdown token.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

/// Handle to the running accept loop
pub struct ListenerHandle {
    port: u16,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// The port actually bound (differs from the requested one when that was 0)
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting without touching live connections
    pub fn abort(self) {
        self.task.abort();
    }
}

impl ConnectionManager {
    pub fn new(
        local_device_type: DeviceType,
        max_envelope_size: usize,
        events: mpsc::Sender<SessionEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: PeerRegistry::new(),
                local_device_type,
                max_envelope_size,
                events,
                connecting: Mutex::new(HashSet::new()),
                next_id: AtomicU64::new(1),
                shutdown,
            }),
        }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.inner.registry
    }

    /// Bind the listening port and start accepting peers.
    ///
    /// Failing to bind is the one unrecoverable startup error.
    pub async fn listen(&self, port: u16) -> Result<ListenerHandle> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { port, source })?;

        let actual_port = listener.local_addr()?.port();
        tracing::info!("listening for peers on port {}", actual_port);

        let manager = self.clone();
        let task = tokio::spawn(async move { manager.accept_loop(listener).await });

        Ok(ListenerHandle {
            port: actual_port,
            task,
        })
    }

    async fn accept_loop(self, listener: TcpListener) {
        let shutdown = self.inner.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("listener stopped");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tracing::debug!("incoming connection from {}", addr);
                        let manager = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = manager.handle_inbound(stream, addr).await {
                                tracing::warn!("inbound connection from {} failed: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("accept error: {}", e);
                    }
                }
            }
        }
    }

    async fn handle_inbound(self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        // dropping the pending handshake closes the socket
        let ws = tokio::select! {
            _ = self.inner.shutdown.cancelled() => return Ok(()),
            result = tokio::time::timeout(CONNECT_TIMEOUT, accept_async(stream)) => match result {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => return Err(Error::Network(format!("handshake failed: {}", e))),
                Err(_) => return Err(Error::Network("handshake timed out".to_string())),
            },
        };

        let address = peer_address(addr.ip());
        let (sink, stream) = ws.split();
        let Some(peer) = self
            .register(address, Direction::Inbound, canonical(addr), sink)
            .await
        else {
            return Ok(());
        };
        tracing::info!("peer {} connected", peer.address);

        self.receive_loop(peer, stream).await;
        Ok(())
    }

    /// Open an outbound connection and announce our device type on it.
    ///
    /// A no-op when the address is already connecting or open. If the peer
    /// dialed us at the same moment and its connection wins the tie-break,
    /// this one is closed and the call still succeeds.
    pub async fn connect(&self, ip: IpAddr, port: u16) -> Result<()> {
        let address = peer_address(ip);
        {
            let mut connecting = self.inner.connecting.lock().await;
            if connecting.contains(&address) || self.inner.registry.contains(&address).await {
                tracing::debug!("already connected or connecting to {}", address);
                return Ok(());
            }
            connecting.insert(address.clone());
        }

        let target = SocketAddr::new(ip, port);
        tracing::debug!("connecting to ws://{}/", target);

        let attempt = tokio::select! {
            _ = self.inner.shutdown.cancelled() => Err("shutting down".to_string()),
            result = tokio::time::timeout(CONNECT_TIMEOUT, dial(target)) => match result {
                Ok(attempt) => attempt,
                Err(_) => Err("timed out".to_string()),
            },
        };
        self.inner.connecting.lock().await.remove(&address);

        let (ws, local) = attempt.map_err(|reason| Error::Connection {
            address: address.clone(),
            reason,
        })?;

        let (sink, stream) = ws.split();
        let Some(peer) = self.register(address, Direction::Outbound, local, sink).await else {
            return Ok(());
        };
        tracing::info!("connected to {}:{}", peer.address, port);

        let announced = self
            .send_on(&peer, &Envelope::device_info(self.inner.local_device_type))
            .await;
        if let Err(e) = announced {
            // a simultaneous inbound connection may have taken over the address
            if self.inner.registry.contains(&peer.address).await {
                return Ok(());
            }
            return Err(e);
        }

        let manager = self.clone();
        tokio::spawn(async move { manager.receive_loop(peer, stream).await });
        Ok(())
    }

    /// Encode and write one envelope to a live peer.
    ///
    /// A failed write drops the peer; retrying is up to the caller.
    pub async fn send(&self, address: &str, envelope: &Envelope) -> Result<()> {
        let peer = self
            .inner
            .registry
            .get(address)
            .await
            .ok_or_else(|| Error::PeerNotFound(address.to_string()))?;

        self.send_on(&peer, envelope).await
    }

    async fn send_on(&self, peer: &Peer, envelope: &Envelope) -> Result<()> {
        let text = envelope.encode_text(self.inner.max_envelope_size)?;

        if let Err(e) = peer.link.send_text(text).await {
            tracing::error!("write to {} failed: {}", peer.address, e);
            self.handle_closed(&peer.address, peer.connection_id).await;
            peer.link.close().await;
            return Err(Error::Network(format!("write to {} failed: {}", peer.address, e)));
        }

        tracing::debug!("sent {} to {}", envelope.kind(), peer.address);
        Ok(())
    }

    /// Close the connection to `address` from our side
    pub async fn disconnect(&self, address: &str) -> Result<()> {
        let peer = self
            .inner
            .registry
            .remove(address)
            .await
            .ok_or_else(|| Error::PeerNotFound(address.to_string()))?;

        peer.link.close().await;
        tracing::info!("disconnected from {}", address);
        self.emit(SessionEvent::PeerClosed {
            address: address.to_string(),
        })
        .await;
        Ok(())
    }

    pub async fn connection_state(&self, address: &str) -> ConnectionState {
        if self.inner.registry.contains(address).await {
            ConnectionState::Open
        } else if self.inner.connecting.lock().await.contains(address) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Closed
        }
    }

    /// Stop the listener and every receive loop, then close all sockets
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let peers = self.inner.registry.drain().await;
        tracing::info!("closing {} peer connection(s)", peers.len());
        for peer in peers {
            peer.link.close().await;
        }
    }

    /// Add a freshly opened connection to the registry.
    ///
    /// Returns `None` when the connection lost a simultaneous-open tie-break
    /// or arrived after shutdown; its socket is closed already.
    async fn register<S>(
        &self,
        address: String,
        direction: Direction,
        initiator: SocketAddr,
        sink: S,
    ) -> Option<Peer>
    where
        S: futures::Sink<Message, Error = WsError> + Send + 'static,
    {
        let link = PeerLink::new(sink, self.inner.shutdown.child_token());
        let peer = Peer {
            address: address.clone(),
            connection_id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            direction,
            initiator,
            device_type: DeviceType::Unknown,
            connected_at: Instant::now(),
            link,
        };

        if self.inner.shutdown.is_cancelled() {
            peer.link.close().await;
            return None;
        }

        let mut announce_on_new = false;
        match self
            .inner
            .registry
            .upsert_preferring(peer.clone(), SIMULTANEOUS_OPEN_WINDOW)
            .await
        {
            Upsert::Inserted => {}
            Upsert::Replaced(previous) => {
                tracing::info!(
                    "replacing connection {} to {}",
                    previous.connection_id,
                    previous.address
                );
                announce_on_new =
                    previous.direction == Direction::Outbound && direction == Direction::Inbound;
                tokio::spawn(async move { previous.link.close().await });
            }
            Upsert::Kept(existing) => {
                tracing::info!(
                    "keeping connection {} to {}, closing simultaneous connection {}",
                    existing.connection_id,
                    existing.address,
                    peer.connection_id
                );
                peer.link.close().await;
                // the peer only hears our device type on connections we opened
                if existing.direction == Direction::Inbound {
                    self.announce(&existing).await;
                }
                return None;
            }
        }

        self.emit(SessionEvent::PeerConnected { address, direction })
            .await;
        if announce_on_new {
            self.announce(&peer).await;
        }
        Some(peer)
    }

    async fn announce(&self, peer: &Peer) {
        let envelope = Envelope::device_info(self.inner.local_device_type);
        if let Err(e) = self.send_on(peer, &envelope).await {
            tracing::warn!("could not announce device type to {}: {}", peer.address, e);
        }
    }

    async fn receive_loop<S>(self, peer: Peer, mut stream: S)
    where
        S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
    {
        let token = peer.link.token().clone();
        loop {
            let frame = tokio::select! {
                _ = token.cancelled() => break,
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => self.handle_frame(&peer, text.as_bytes()).await,
                Some(Ok(Message::Binary(data))) => self.handle_frame(&peer, &data).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("read from {} failed: {}", peer.address, e);
                    break;
                }
            }
        }

        self.handle_closed(&peer.address, peer.connection_id).await;
    }

    async fn handle_frame(&self, peer: &Peer, bytes: &[u8]) {
        let envelope = match Envelope::decode_limited(bytes, self.inner.max_envelope_size) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("dropping frame from {}: {}", peer.address, e);
                return;
            }
        };

        tracing::debug!("received {} from {}", envelope.kind(), peer.address);

        if let Envelope::DeviceInfo { device_type } = &envelope {
            self.inner
                .registry
                .set_device_type(&peer.address, peer.connection_id, *device_type)
                .await;
        }

        self.emit(SessionEvent::EnvelopeReceived {
            address: peer.address.clone(),
            envelope,
        })
        .await;
    }

    async fn handle_closed(&self, address: &str, connection_id: ConnectionId) {
        if self
            .inner
            .registry
            .remove_connection(address, connection_id)
            .await
            .is_some()
        {
            tracing::info!("connection to {} closed", address);
            self.emit(SessionEvent::PeerClosed {
                address: address.to_string(),
            })
            .await;
        }
    }

    async fn emit(&self, event: SessionEvent) {
        if self.inner.events.send(event).await.is_err() {
            tracing::debug!("session event channel closed");
        }
    }
}

/// Registry key for a remote IP; IPv4-mapped IPv6 addresses collapse to IPv4
fn peer_address(ip: IpAddr) -> String {
    ip.to_canonical().to_string()
}

fn canonical(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

/// TCP connect plus client handshake; also yields our end of the socket
async fn dial(
    target: SocketAddr,
) -> std::result::Result<(WebSocketStream<TcpStream>, SocketAddr), String> {
    let stream = TcpStream::connect(target).await.map_err(|e| e.to_string())?;
    let local = stream.local_addr().map_err(|e| e.to_string())?;
    let (ws, _response) = client_async(format!("ws://{}/", target), stream)
        .await
        .map_err(|e| e.to_string())?;
    Ok((ws, canonical(local)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use tokio::io::AsyncReadExt;
    use tokio_test::{assert_err, assert_ok};
    use tokio_tungstenite::connect_async;

    const LOCALHOST: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);

    fn manager() -> (ConnectionManager, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let manager = ConnectionManager::new(
            DeviceType::Desktop,
            crate::protocol::constants::MAX_ENVELOPE_SIZE,
            tx,
            CancellationToken::new(),
        );
        (manager, rx)
    }

    async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn next_envelope(rx: &mut mpsc::Receiver<SessionEvent>) -> Envelope {
        loop {
            if let SessionEvent::EnvelopeReceived { envelope, .. } = next_event(rx).await {
                return envelope;
            }
        }
    }

    async fn wait_closed(rx: &mut mpsc::Receiver<SessionEvent>) -> String {
        loop {
            if let SessionEvent::PeerClosed { address } = next_event(rx).await {
                return address;
            }
        }
    }

    #[tokio::test]
    async fn test_connect_registers_and_announces_device_type() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, mut client_rx) = manager();

        assert_ok!(client.connect(LOCALHOST, listener.port()).await);
        assert_eq!(client.connection_state("127.0.0.1").await, ConnectionState::Open);
        match next_event(&mut client_rx).await {
            SessionEvent::PeerConnected { address, direction } => {
                assert_eq!(address, "127.0.0.1");
                assert_eq!(direction, Direction::Outbound);
            }
            other => panic!("unexpected event {:?}", other),
        }

        match next_event(&mut server_rx).await {
            SessionEvent::PeerConnected { direction, .. } => assert_eq!(direction, Direction::Inbound),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(
            next_envelope(&mut server_rx).await,
            Envelope::device_info(DeviceType::Desktop)
        );

        let peer = server.registry().get("127.0.0.1").await.unwrap();
        assert_eq!(peer.device_type, DeviceType::Desktop);
    }

    #[tokio::test]
    async fn test_file_envelope_reaches_peer() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, _client_rx) = manager();
        client.connect(LOCALHOST, listener.port()).await.unwrap();
        next_envelope(&mut server_rx).await;

        client
            .send("127.0.0.1", &Envelope::file("a.txt", b"hello".to_vec()))
            .await
            .unwrap();

        assert_eq!(
            next_envelope(&mut server_rx).await,
            Envelope::file("a.txt", b"hello".to_vec())
        );
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, _client_rx) = manager();
        client.connect(LOCALHOST, listener.port()).await.unwrap();
        next_envelope(&mut server_rx).await;

        let result = client.send("10.9.9.9", &Envelope::message("hi")).await;
        assert!(matches!(result, Err(Error::PeerNotFound(addr)) if addr == "10.9.9.9"));

        // the live peer is untouched
        assert!(client.registry().contains("127.0.0.1").await);
        client.send("127.0.0.1", &Envelope::message("still here")).await.unwrap();
        assert_eq!(next_envelope(&mut server_rx).await, Envelope::message("still here"));
    }

    #[tokio::test]
    async fn test_connect_failure_registers_nothing() {
        // grab a free port, then release it so nothing is listening
        let port = {
            let spare = TcpListener::bind("127.0.0.1:0").await.unwrap();
            spare.local_addr().unwrap().port()
        };

        let (client, _rx) = manager();
        let result = client.connect(LOCALHOST, port).await;

        assert!(matches!(result, Err(Error::Connection { .. })));
        assert!(client.registry().is_empty().await);
        assert_eq!(client.connection_state("127.0.0.1").await, ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_remote_close_removes_peer() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, _client_rx) = manager();
        client.connect(LOCALHOST, listener.port()).await.unwrap();
        next_envelope(&mut server_rx).await;

        client.disconnect("127.0.0.1").await.unwrap();

        assert_eq!(wait_closed(&mut server_rx).await, "127.0.0.1");
        assert!(server.registry().is_empty().await);
        assert!(client.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_bad_frames_keep_connection_open() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();

        let url = format!("ws://127.0.0.1:{}/", listener.port());
        let (mut ws, _) = connect_async(url).await.unwrap();
        ws.send(Message::text("not json at all")).await.unwrap();
        ws.send(Message::text(r#"{"type":"file","content":"aGVsbG8="}"#)).await.unwrap();
        ws.send(Message::text(r#"{"type":"hologram"}"#)).await.unwrap();
        ws.send(Message::text(r#"{"type":"battery-level","level":42}"#)).await.unwrap();

        assert_eq!(
            next_envelope(&mut server_rx).await,
            Envelope::Unrecognized { kind: "hologram".to_string() }
        );
        assert_eq!(
            next_envelope(&mut server_rx).await,
            Envelope::BatteryLevel { level: 42 }
        );
        assert!(server.registry().contains("127.0.0.1").await);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_dropped() {
        let (tx, mut server_rx) = mpsc::channel(64);
        let server = ConnectionManager::new(DeviceType::Desktop, 64, tx, CancellationToken::new());
        let listener = server.listen(0).await.unwrap();

        let url = format!("ws://127.0.0.1:{}/", listener.port());
        let (mut ws, _) = connect_async(url).await.unwrap();
        let big = format!(r#"{{"type":"message","content":"{}"}}"#, "x".repeat(128));
        ws.send(Message::text(big)).await.unwrap();
        ws.send(Message::text(r#"{"type":"message","content":"ok"}"#)).await.unwrap();

        assert_eq!(next_envelope(&mut server_rx).await, Envelope::message("ok"));
    }

    #[tokio::test]
    async fn test_duplicate_connect_is_noop() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, _client_rx) = manager();

        client.connect(LOCALHOST, listener.port()).await.unwrap();
        let first = client.registry().get("127.0.0.1").await.unwrap().connection_id;
        client.connect(LOCALHOST, listener.port()).await.unwrap();

        assert_eq!(
            client.registry().get("127.0.0.1").await.unwrap().connection_id,
            first
        );
        next_envelope(&mut server_rx).await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let (server, mut server_rx) = manager();
        let listener = server.listen(0).await.unwrap();
        let (client, mut client_rx) = manager();
        client.connect(LOCALHOST, listener.port()).await.unwrap();
        next_envelope(&mut server_rx).await;

        server.shutdown().await;

        assert!(server.registry().is_empty().await);
        assert_eq!(wait_closed(&mut client_rx).await, "127.0.0.1");
        assert!(client.registry().is_empty().await);

        // the listening socket is released
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_err!(client.connect(LOCALHOST, listener.port()).await);
    }

    #[tokio::test]
    async fn test_shutdown_drops_pending_handshake() {
        let (server, _rx) = manager();
        let listener = server.listen(0).await.unwrap();

        // a TCP client that never sends the upgrade request
        let mut socket = TcpStream::connect((LOCALHOST, listener.port())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.shutdown().await;

        let mut buf = [0u8; 64];
        let read = tokio::time::timeout(Duration::from_secs(2), socket.read(&mut buf)).await;
        assert!(
            matches!(read, Ok(Ok(0)) | Ok(Err(_))),
            "socket still open after shutdown: {:?}",
            read
        );
        assert!(server.registry().is_empty().await);
    }

    async fn next_message(rx: &mut mpsc::Receiver<SessionEvent>) -> Envelope {
        loop {
            match next_envelope(rx).await {
                Envelope::DeviceInfo { .. } => continue,
                envelope => return envelope,
            }
        }
    }

    /// Initiator of the single registered connection, once both sides agree
    async fn settled(a: &ConnectionManager, b: &ConnectionManager) -> SocketAddr {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut last = None;
        loop {
            assert!(Instant::now() < deadline, "connections never settled");
            let (ours, theirs) = (a.registry().snapshot().await, b.registry().snapshot().await);
            let agreed = match (ours.as_slice(), theirs.as_slice()) {
                ([x], [y]) if x.initiator == y.initiator && !x.link.is_closed() => {
                    Some(x.initiator)
                }
                _ => None,
            };
            if let (Some(now), Some(before)) = (agreed, last) {
                if now == before {
                    return now;
                }
            }
            last = agreed;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_connect_keeps_one_shared_connection() {
        for round in 0..10 {
            let (a, mut a_rx) = manager();
            let (b, mut b_rx) = manager();
            let a_port = a.listen(0).await.unwrap().port();
            let b_port = b.listen(0).await.unwrap().port();

            let _ = tokio::join!(a.connect(LOCALHOST, b_port), b.connect(LOCALHOST, a_port));
            let initiator = settled(&a, &b).await;
            assert!(
                initiator.port() != a_port && initiator.port() != b_port,
                "round {}: initiator should be an ephemeral port",
                round
            );

            a.send("127.0.0.1", &Envelope::message(format!("ping {}", round))).await.unwrap();
            assert_eq!(
                next_message(&mut b_rx).await,
                Envelope::message(format!("ping {}", round))
            );
            b.send("127.0.0.1", &Envelope::message("pong")).await.unwrap();
            assert_eq!(next_message(&mut a_rx).await, Envelope::message("pong"));

            a.shutdown().await;
            b.shutdown().await;
        }
    }

    #[test]
    fn test_peer_address_unmaps_ipv4() {
        let mapped: IpAddr = "::ffff:192.168.1.20".parse().unwrap();
        assert_eq!(peer_address(mapped), "192.168.1.20");
        assert_eq!(peer_address("fe80::1".parse().unwrap()), "fe80::1");
    }
}
