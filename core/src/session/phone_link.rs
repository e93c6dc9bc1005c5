//! Phone-link state: is a mobile device currently linked?

use std::collections::HashMap;

use tokio::sync::watch;

use crate::connection::PeerRegistry;
use crate::protocol::DeviceType;

/// Phone-link flag plus the discovery hints that feed it.
///
/// A live peer that announced `mobile` links the phone. Discovery may also
/// hint that an address is a phone before any connection exists; a hint
/// counts only until that address is registered with a known device type,
/// after which the connection's own announcement decides.
pub struct PhoneLink {
    hints: HashMap<String, String>,
    state: watch::Sender<bool>,
}

impl PhoneLink {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (state, rx) = watch::channel(false);
        (
            Self {
                hints: HashMap::new(),
                state,
            },
            rx,
        )
    }

    /// Discovery saw `name` at `address` advertising itself as mobile
    pub fn hint(&mut self, address: String, name: String) {
        self.hints.insert(address, name);
    }

    pub fn clear_address(&mut self, address: &str) -> bool {
        self.hints.remove(address).is_some()
    }

    pub fn clear_name(&mut self, name: &str) -> bool {
        let before = self.hints.len();
        self.hints.retain(|_, hinted| hinted != name);
        self.hints.len() != before
    }

    /// Evaluate the link rule against the current registry
    pub async fn recompute(&self, registry: &PeerRegistry) -> bool {
        let peers: Vec<(String, DeviceType)> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|peer| (peer.address, peer.device_type))
            .collect();
        is_linked(&peers, self.hints.keys())
    }

    /// Store a new value, returning whether it changed
    pub fn store(&self, linked: bool) -> bool {
        self.state.send_if_modified(|current| {
            if *current == linked {
                false
            } else {
                *current = linked;
                true
            }
        })
    }

    pub fn get(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

fn is_linked<'a>(
    peers: &[(String, DeviceType)],
    mut hinted: impl Iterator<Item = &'a String>,
) -> bool {
    let confirmed = peers
        .iter()
        .any(|(_, device_type)| *device_type == DeviceType::Mobile);

    confirmed
        || hinted.any(|address| {
            !peers
                .iter()
                .any(|(addr, device_type)| addr == address && *device_type != DeviceType::Unknown)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers(list: &[(&str, DeviceType)]) -> Vec<(String, DeviceType)> {
        list.iter().map(|(a, t)| (a.to_string(), *t)).collect()
    }

    #[test]
    fn test_mobile_peer_links() {
        let live = peers(&[("10.0.0.2", DeviceType::Desktop), ("10.0.0.3", DeviceType::Mobile)]);
        assert!(is_linked(&live, std::iter::empty()));

        let live = peers(&[("10.0.0.2", DeviceType::Desktop)]);
        assert!(!is_linked(&live, std::iter::empty()));
    }

    #[test]
    fn test_hint_counts_until_type_is_known() {
        let hints = vec!["10.0.0.3".to_string()];

        // not connected yet
        assert!(is_linked(&[], hints.iter()));

        // connected, no announcement yet
        let live = peers(&[("10.0.0.3", DeviceType::Unknown)]);
        assert!(is_linked(&live, hints.iter()));

        // connection says it is not a phone
        let live = peers(&[("10.0.0.3", DeviceType::Desktop)]);
        assert!(!is_linked(&live, hints.iter()));
    }

    #[test]
    fn test_clear_hints() {
        let (mut link, _rx) = PhoneLink::new();
        link.hint("10.0.0.3".to_string(), "pixel".to_string());
        link.hint("10.0.0.4".to_string(), "tablet".to_string());

        assert!(link.clear_name("pixel"));
        assert!(!link.clear_name("pixel"));
        assert!(link.clear_address("10.0.0.4"));
        assert!(!link.clear_address("10.0.0.4"));
    }

    #[test]
    fn test_store_reports_changes() {
        let (link, rx) = PhoneLink::new();
        assert!(!link.store(false));
        assert!(link.store(true));
        assert!(!link.store(true));
        assert!(link.get());
        assert!(*rx.borrow());
    }
}
