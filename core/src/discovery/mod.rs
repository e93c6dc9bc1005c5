//! mDNS advertisement and browsing for companion devices

use std::collections::HashMap;
use std::net::IpAddr;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::constants::{TXT_DEVICE_TYPE, TXT_INSTANCE_ID, TXT_SERVICE};
use crate::protocol::DeviceType;
use crate::session::SessionEvent;
use crate::{DeviceIdentity, Error, Result};

/// A resolved service record, before self-exclusion
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub fullname: String,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
    pub properties: HashMap<String, String>,
}

impl ServiceRecord {
    fn from_info(info: &ServiceInfo) -> Self {
        Self {
            fullname: info.get_fullname().to_string(),
            addresses: info.get_addresses().iter().copied().collect(),
            port: info.get_port(),
            properties: info
                .get_properties()
                .iter()
                .map(|p| (p.key().to_string(), p.val_str().to_string()))
                .collect(),
        }
    }
}

/// Another host advertising our service, with a usable address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeer {
    pub name: String,
    pub instance_id: Option<Uuid>,
    pub address: IpAddr,
    pub port: u16,
    pub device_type: DeviceType,
}

/// mDNS discovery service
pub struct DiscoveryService {
    daemon: ServiceDaemon,
    identity: DeviceIdentity,
    service_type: String,
    service: ServiceInfo,
}

impl DiscoveryService {
    /// Create the daemon and prepare our service record for `port`
    pub fn new(identity: DeviceIdentity, service_type: &str, service_id: &str, port: u16) -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| Error::Discovery(e.to_string()))?;

        let mut properties = HashMap::new();
        properties.insert(TXT_SERVICE.to_string(), service_id.to_string());
        properties.insert(TXT_DEVICE_TYPE.to_string(), identity.device_type.as_str().to_string());
        properties.insert(TXT_INSTANCE_ID.to_string(), identity.instance_id.to_string());

        let host = format!("{}.local.", sanitize_host(&identity.name));
        let service = ServiceInfo::new(service_type, &identity.name, &host, (), port, properties)
            .map_err(|e| Error::Discovery(e.to_string()))?
            .enable_addr_auto();

        Ok(Self {
            daemon,
            identity,
            service_type: service_type.to_string(),
            service,
        })
    }

    /// Full mDNS name of our own record
    pub fn fullname(&self) -> &str {
        self.service.get_fullname()
    }

    /// Publish our service record
    pub fn advertise(&self) -> Result<()> {
        self.daemon
            .register(self.service.clone())
            .map_err(|e| Error::Discovery(e.to_string()))?;

        tracing::info!("advertising {} as {}", self.service_type, self.identity.name);
        Ok(())
    }

    /// Watch for peers, feeding `PeerDiscovered`/`PeerLost` into the session
    pub fn browse(
        &self,
        events: mpsc::Sender<SessionEvent>,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let receiver = self
            .daemon
            .browse(&self.service_type)
            .map_err(|e| Error::Discovery(e.to_string()))?;
        let identity = self.identity.clone();
        let service_type = self.service_type.clone();

        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = receiver.recv_async() => match event {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("mDNS browse ended: {}", e);
                            break;
                        }
                    },
                };

                let session_event = match event {
                    ServiceEvent::ServiceResolved(info) => {
                        let record = ServiceRecord::from_info(&info);
                        match resolve_peer(&identity, &service_type, &record) {
                            Some(peer) => SessionEvent::PeerDiscovered(peer),
                            None => continue,
                        }
                    }
                    ServiceEvent::ServiceRemoved(_, fullname) => {
                        let name = instance_name(&fullname, &service_type);
                        tracing::info!("peer {} went away", name);
                        SessionEvent::PeerLost { name }
                    }
                    _ => continue,
                };

                if events.send(session_event).await.is_err() {
                    break;
                }
            }
            tracing::debug!("browse loop stopped");
        });

        Ok(handle)
    }

    /// Withdraw our record and stop the daemon
    pub fn shutdown(&self) {
        match self.daemon.unregister(self.fullname()) {
            Ok(_) => tracing::info!("withdrew service {}", self.fullname()),
            Err(e) => tracing::warn!("failed to unregister service: {}", e),
        }
        if let Err(e) = self.daemon.shutdown() {
            tracing::warn!("failed to stop mDNS daemon: {}", e);
        }
    }
}

/// Turn a resolved record into a connectable peer.
///
/// Returns `None` for our own record (same name or same instance id) and for
/// records without a usable address.
pub fn resolve_peer(
    identity: &DeviceIdentity,
    service_type: &str,
    record: &ServiceRecord,
) -> Option<DiscoveredPeer> {
    let name = instance_name(&record.fullname, service_type);
    let instance_id = record
        .properties
        .get(TXT_INSTANCE_ID)
        .and_then(|v| v.parse::<Uuid>().ok());

    if name == identity.name || instance_id == Some(identity.instance_id) {
        tracing::trace!("ignoring our own advertisement");
        return None;
    }

    let Some(address) = select_address(&record.addresses) else {
        tracing::debug!("peer {} has no usable address", name);
        return None;
    };

    let device_type = record
        .properties
        .get(TXT_DEVICE_TYPE)
        .map(|v| DeviceType::from_wire(v))
        .unwrap_or_default();

    tracing::info!("discovered {} ({}) at {}:{}", name, device_type, address, record.port);

    Some(DiscoveredPeer {
        name,
        instance_id,
        address,
        port: record.port,
        device_type,
    })
}

/// Prefer an IPv4 address; fall back to a routable IPv6 one.
///
/// Link-local IPv6 needs a scope id we do not get from the record.
pub fn select_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    let mut sorted = addresses.to_vec();
    sorted.sort();

    sorted
        .iter()
        .find(|ip| ip.is_ipv4() && !ip.is_loopback())
        .or_else(|| {
            sorted.iter().find(|ip| match ip {
                IpAddr::V6(v6) => !v6.is_loopback() && (v6.segments()[0] & 0xffc0) != 0xfe80,
                IpAddr::V4(_) => false,
            })
        })
        .copied()
}

/// Instance name from a full service name, e.g. `laptop._hackeros-connect._tcp.local.`
fn instance_name(fullname: &str, service_type: &str) -> String {
    fullname
        .strip_suffix(service_type)
        .map(|prefix| prefix.trim_end_matches('.'))
        .unwrap_or_else(|| fullname.split('.').next().unwrap_or(fullname))
        .to_string()
}

/// mDNS host labels cannot contain dots or spaces
fn sanitize_host(name: &str) -> String {
    let host: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    if host.is_empty() {
        "hackeros-connect".to_string()
    } else {
        host
    }
}

/// Get local IP addresses (non-loopback)
pub fn get_local_ips() -> Vec<IpAddr> {
    let mut ips = Vec::new();

    if let Ok(interfaces) = get_if_addrs::get_if_addrs() {
        for iface in interfaces {
            if !iface.is_loopback() {
                ips.push(iface.ip());
            }
        }
    }

    ips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::SERVICE_TYPE;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("workstation".to_string(), DeviceType::Desktop)
    }

    fn record(name: &str, addresses: &[&str], props: &[(&str, &str)]) -> ServiceRecord {
        ServiceRecord {
            fullname: format!("{}.{}", name, SERVICE_TYPE),
            addresses: addresses.iter().map(|a| a.parse().unwrap()).collect(),
            port: 8765,
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_self_excluded_by_name() {
        let rec = record("workstation", &["192.168.1.5"], &[("deviceType", "desktop")]);
        assert_eq!(resolve_peer(&identity(), SERVICE_TYPE, &rec), None);
    }

    #[test]
    fn test_self_excluded_by_instance_id() {
        let me = identity();
        let id = me.instance_id.to_string();
        let rec = record("renamed-host", &["192.168.1.5"], &[("id", id.as_str())]);
        assert_eq!(resolve_peer(&me, SERVICE_TYPE, &rec), None);
    }

    #[test]
    fn test_resolves_mobile_peer() {
        let rec = record(
            "pixel",
            &["fe80::1", "192.168.1.40"],
            &[("service", "hackeros-connect"), ("deviceType", "mobile")],
        );
        let peer = resolve_peer(&identity(), SERVICE_TYPE, &rec).unwrap();

        assert_eq!(peer.name, "pixel");
        assert_eq!(peer.address, "192.168.1.40".parse::<IpAddr>().unwrap());
        assert_eq!(peer.port, 8765);
        assert_eq!(peer.device_type, DeviceType::Mobile);
        assert_eq!(peer.instance_id, None);
    }

    #[test]
    fn test_missing_device_type_is_unknown() {
        let rec = record("tablet", &["10.0.0.8"], &[]);
        let peer = resolve_peer(&identity(), SERVICE_TYPE, &rec).unwrap();
        assert_eq!(peer.device_type, DeviceType::Unknown);
    }

    #[test]
    fn test_no_usable_address() {
        let rec = record("pixel", &["fe80::1"], &[]);
        assert_eq!(resolve_peer(&identity(), SERVICE_TYPE, &rec), None);
    }

    #[test]
    fn test_select_address_prefers_ipv4() {
        let addrs: Vec<IpAddr> = vec!["2001:db8::5".parse().unwrap(), "10.0.0.5".parse().unwrap()];
        assert_eq!(select_address(&addrs), Some("10.0.0.5".parse().unwrap()));

        let v6_only: Vec<IpAddr> = vec!["fe80::2".parse().unwrap(), "2001:db8::5".parse().unwrap()];
        assert_eq!(select_address(&v6_only), Some("2001:db8::5".parse().unwrap()));

        assert_eq!(select_address(&[]), None);
    }

    #[test]
    fn test_instance_name() {
        assert_eq!(instance_name("my.laptop._hackeros-connect._tcp.local.", SERVICE_TYPE), "my.laptop");
        assert_eq!(instance_name("other._foo._tcp.local.", SERVICE_TYPE), "other");
    }

    #[test]
    fn test_sanitize_host() {
        assert_eq!(sanitize_host("Bob's PC"), "Bob-s-PC");
        assert_eq!(sanitize_host(""), "hackeros-connect");
    }

    #[test]
    fn test_get_local_ips() {
        let ips = get_local_ips();
        assert!(ips.iter().all(|ip| !ip.is_loopback()));
    }
}
