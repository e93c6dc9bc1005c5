//! HackerOS Connect Core - LAN peer discovery and session engine
//!
//! Desktop hosts and companion phones find each other over mDNS, hold one
//! WebSocket per peer and exchange JSON envelopes: chat messages, files,
//! clipboard contents, notifications, remote commands and device status.

pub mod clipboard;
pub mod connection;
pub mod discovery;
pub mod protocol;
pub mod service;
pub mod session;
pub mod sinks;

mod error;

use std::path::PathBuf;

use serde::Deserialize;

pub use error::{DecodeError, EncodeError, Error, Result};

use protocol::constants;
use protocol::DeviceType;

/// Who this process is on the network
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub name: String,
    /// Fresh per process; lets us recognise our own advertisement after a rename
    pub instance_id: uuid::Uuid,
    pub device_type: DeviceType,
}

impl DeviceIdentity {
    pub fn new(name: String, device_type: DeviceType) -> Self {
        Self {
            name,
            instance_id: uuid::Uuid::new_v4(),
            device_type,
        }
    }
}

/// Configuration for the HackerOS Connect service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on for incoming connections
    pub port: u16,
    /// mDNS service type to advertise and browse
    pub service_type: String,
    /// Value of the `service` TXT attribute
    pub service_id: String,
    /// Name advertised to other devices
    pub device_name: String,
    pub device_type: DeviceType,
    /// Largest envelope accepted or sent, in bytes
    pub max_envelope_size: usize,
    /// Where received files are saved
    pub download_dir: PathBuf,
    pub discovery_enabled: bool,
    pub advertise_retry_secs: u64,
    pub advertise_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT,
            service_type: constants::SERVICE_TYPE.to_string(),
            service_id: constants::SERVICE_ID.to_string(),
            device_name: default_device_name(),
            device_type: DeviceType::Desktop,
            max_envelope_size: constants::MAX_ENVELOPE_SIZE,
            download_dir: default_download_dir(),
            discovery_enabled: true,
            advertise_retry_secs: constants::ADVERTISE_RETRY_SECS,
            advertise_max_attempts: constants::ADVERTISE_MAX_ATTEMPTS,
        }
    }
}

fn default_device_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "hackeros-device".to_string())
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

// Re-export key types for convenience
pub use connection::{ConnectionManager, ConnectionState, Peer};
pub use discovery::{DiscoveredPeer, DiscoveryService};
pub use protocol::{Envelope, RemoteCommand};
pub use service::ConnectService;
pub use session::SessionEvent;
pub use sinks::Sinks;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8765);
        assert_eq!(config.service_type, "_hackeros-connect._tcp.local.");
        assert_eq!(config.service_id, "hackeros-connect");
        assert_eq!(config.device_type, DeviceType::Desktop);
        assert!(config.discovery_enabled);
        assert!(!config.device_name.is_empty());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"port": 9000, "device_type": "mobile"}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.device_type, DeviceType::Mobile);
        assert_eq!(config.max_envelope_size, constants::MAX_ENVELOPE_SIZE);
    }

    #[test]
    fn test_identities_are_unique() {
        let a = DeviceIdentity::new("host".to_string(), DeviceType::Desktop);
        let b = DeviceIdentity::new("host".to_string(), DeviceType::Desktop);
        assert_ne!(a.instance_id, b.instance_id);
    }
}
