//! Events consumed by the session dispatcher

use crate::connection::Direction;
use crate::discovery::DiscoveredPeer;
use crate::protocol::Envelope;

/// Everything that can change session state, funnelled through one channel.
///
/// A connection's receive loop is the only producer of its own events, so
/// envelopes from one peer reach the dispatcher in stream order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A socket was accepted or an outbound connection opened
    PeerConnected { address: String, direction: Direction },

    /// A frame from `address` decoded successfully
    EnvelopeReceived { address: String, envelope: Envelope },

    /// The registered connection for `address` went away
    PeerClosed { address: String },

    /// An outbound attempt triggered by discovery failed
    ConnectFailed { address: String },

    /// Discovery resolved another host advertising our service
    PeerDiscovered(DiscoveredPeer),

    /// Discovery saw a service record withdrawn
    PeerLost { name: String },
}
