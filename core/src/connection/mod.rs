//! WebSocket peer connections

mod link;
mod manager;
pub mod registry;

pub use link::PeerLink;
pub use manager::{ConnectionManager, ConnectionState, ListenerHandle};
pub use registry::{ConnectionId, Direction, Peer, PeerRegistry, Upsert};

#[cfg(test)]
pub(crate) use link::test_link;
