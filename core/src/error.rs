use thiserror::Error;

/// HackerOS Connect error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode envelope: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] EncodeError),

    #[error("Connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons an inbound frame could not be turned into an envelope.
///
/// None of these close the connection; the frame is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("frame has no \"type\" field")]
    MissingType,

    #[error("\"{kind}\" envelope is missing \"{field}\"")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("\"{kind}\" envelope has invalid \"{field}\": {reason}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Reasons an outbound envelope was rejected before reaching the wire.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot send envelope of unrecognized type \"{0}\"")]
    Unrecognized(String),

    #[error("\"{kind}\" envelope requires a non-empty \"{field}\"")]
    EmptyField { kind: &'static str, field: &'static str },

    #[error("battery level {0} is outside 0-100")]
    LevelOutOfRange(u8),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
