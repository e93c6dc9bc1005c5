//! Centralized protocol constants
//!
//! Everything a companion device has to agree on lives here: the port, the
//! discovery identifiers and the TXT attribute names.

/// Default port for the WebSocket listener
pub const DEFAULT_PORT: u16 = 8765;

/// Service identifier advertised in the TXT record and used as the mDNS type
pub const SERVICE_ID: &str = "hackeros-connect";

/// mDNS service type for discovery
pub const SERVICE_TYPE: &str = "_hackeros-connect._tcp.local.";

/// TXT attribute carrying the service identifier
pub const TXT_SERVICE: &str = "service";

/// TXT attribute carrying the advertised device type
pub const TXT_DEVICE_TYPE: &str = "deviceType";

/// TXT attribute carrying the per-process instance id
pub const TXT_INSTANCE_ID: &str = "id";

/// Maximum accepted envelope size (64 MB)
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024 * 1024;

/// Capacity of the session event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Delay between advertisement attempts after a failure
pub const ADVERTISE_RETRY_SECS: u64 = 5;

/// Advertisement attempts before giving up
pub const ADVERTISE_MAX_ATTEMPTS: u32 = 5;
