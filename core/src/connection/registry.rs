//! Live peer table keyed by remote address

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::connection::PeerLink;
use crate::protocol::DeviceType;

/// Unique id assigned to every registered connection
pub type ConnectionId = u64;

/// Which side opened the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A live connection to a remote device
#[derive(Debug, Clone)]
pub struct Peer {
    pub address: String,
    pub connection_id: ConnectionId,
    pub direction: Direction,
    /// Socket address of the side that opened the TCP connection
    pub initiator: SocketAddr,
    pub device_type: DeviceType,
    pub connected_at: Instant,
    pub link: PeerLink,
}

/// Outcome of [`PeerRegistry::upsert_preferring`]
#[derive(Debug)]
pub enum Upsert {
    Inserted,
    /// The newcomer took over; holds the displaced peer
    Replaced(Peer),
    /// The existing peer stays; the newcomer was not registered
    Kept(Peer),
}

struct Entry {
    peer: Peer,
    order: u64,
}

#[derive(Default)]
struct Inner {
    peers: HashMap<String, Entry>,
    next_order: u64,
}

impl Inner {
    fn insert(&mut self, peer: Peer) -> Option<Peer> {
        let order = self.next_order;
        self.next_order += 1;
        self.peers
            .insert(peer.address.clone(), Entry { peer, order })
            .map(|entry| entry.peer)
    }
}

/// Whether `newcomer` should take the slot held by `existing`.
///
/// Two connections opened in opposite directions less than `window` apart
/// are a simultaneous open. Both hosts see the same pair of initiator
/// addresses, so keeping the lower one leaves both ends on the same socket.
/// Anything else is a reconnect, and the newer connection wins.
fn takes_over(existing: &Peer, newcomer: &Peer, window: Duration) -> bool {
    let simultaneous = existing.direction != newcomer.direction
        && newcomer.connected_at.saturating_duration_since(existing.connected_at) < window;
    !simultaneous || newcomer.initiator < existing.initiator
}

/// Thread-safe registry of live peers.
///
/// Every mutation takes the write lock, so concurrent accept, connect and
/// close events for the same address apply one at a time.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `peer.address`, returning the replaced peer
    pub async fn upsert(&self, peer: Peer) -> Option<Peer> {
        self.inner.write().await.insert(peer)
    }

    /// Like [`upsert`](Self::upsert), but resolves a simultaneous open
    /// against the existing entry instead of always replacing it
    pub async fn upsert_preferring(&self, peer: Peer, window: Duration) -> Upsert {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.peers.get(&peer.address) {
            if !takes_over(&entry.peer, &peer, window) {
                return Upsert::Kept(entry.peer.clone());
            }
        }
        match inner.insert(peer) {
            Some(previous) => Upsert::Replaced(previous),
            None => Upsert::Inserted,
        }
    }

    /// Remove whatever entry is registered for `address`
    pub async fn remove(&self, address: &str) -> Option<Peer> {
        self.inner
            .write()
            .await
            .peers
            .remove(address)
            .map(|entry| entry.peer)
    }

    /// Remove the entry for `address` only if it still belongs to `connection_id`
    pub async fn remove_connection(&self, address: &str, connection_id: ConnectionId) -> Option<Peer> {
        let mut inner = self.inner.write().await;
        match inner.peers.get(address) {
            Some(entry) if entry.peer.connection_id == connection_id => {
                inner.peers.remove(address).map(|entry| entry.peer)
            }
            _ => None,
        }
    }

    pub async fn get(&self, address: &str) -> Option<Peer> {
        self.inner
            .read()
            .await
            .peers
            .get(address)
            .map(|entry| entry.peer.clone())
    }

    pub async fn contains(&self, address: &str) -> bool {
        self.inner.read().await.peers.contains_key(address)
    }

    /// Addresses of all live peers, most recently added first
    pub async fn list(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner.peers.values().collect();
        entries.sort_by(|a, b| b.order.cmp(&a.order));
        entries.into_iter().map(|e| e.peer.address.clone()).collect()
    }

    /// Record the device type announced on a connection.
    ///
    /// Returns false if the connection is no longer the registered one.
    pub async fn set_device_type(
        &self,
        address: &str,
        connection_id: ConnectionId,
        device_type: DeviceType,
    ) -> bool {
        let mut inner = self.inner.write().await;
        match inner.peers.get_mut(address) {
            Some(entry) if entry.peer.connection_id == connection_id => {
                entry.peer.device_type = device_type;
                true
            }
            _ => false,
        }
    }

    /// Whether any live peer has announced `device_type`
    pub async fn any_of_type(&self, device_type: DeviceType) -> bool {
        self.inner
            .read()
            .await
            .peers
            .values()
            .any(|entry| entry.peer.device_type == device_type)
    }

    pub async fn snapshot(&self) -> Vec<Peer> {
        self.inner
            .read()
            .await
            .peers
            .values()
            .map(|entry| entry.peer.clone())
            .collect()
    }

    /// Empty the registry, handing back every peer
    pub async fn drain(&self) -> Vec<Peer> {
        self.inner
            .write()
            .await
            .peers
            .drain()
            .map(|(_, entry)| entry.peer)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.peers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
