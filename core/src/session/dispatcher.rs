//! Single consumer of session events

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::discovery::DiscoveredPeer;
use crate::protocol::{DeviceType, Envelope};
use crate::session::{PhoneLink, SessionEvent};
use crate::sinks::Sinks;

const TITLE_MESSAGE: &str = "HackerOS Connect Message";
const TITLE_FILE: &str = "HackerOS Connect File";
const TITLE_CLIPBOARD: &str = "HackerOS Connect Clipboard";
const TITLE_NOTIFICATION: &str = "HackerOS Connect Notification";
const TITLE_COMMAND: &str = "HackerOS Connect Command";
const TITLE_LINK: &str = "HackerOS Connect";

/// Routes every session event to exactly one action.
///
/// Owns the phone-link state; nothing else writes it.
pub struct Dispatcher {
    manager: ConnectionManager,
    sinks: Sinks,
    phone_link: PhoneLink,
    events: mpsc::Sender<SessionEvent>,
}

impl Dispatcher {
    /// `events` must feed the receiver later passed to [`Dispatcher::run`]
    pub fn new(
        manager: ConnectionManager,
        sinks: Sinks,
        events: mpsc::Sender<SessionEvent>,
    ) -> (Self, watch::Receiver<bool>) {
        let (phone_link, rx) = PhoneLink::new();
        (
            Self {
                manager,
                sinks,
                phone_link,
                events,
            },
            rx,
        )
    }

    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>, shutdown: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(event).await;
        }
        tracing::debug!("dispatcher stopped");
    }

    pub async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PeerConnected { .. } => {
                self.publish_peer_list().await;
            }
            SessionEvent::EnvelopeReceived { address, envelope } => {
                self.handle_envelope(&address, envelope).await;
            }
            SessionEvent::PeerClosed { address } => {
                self.phone_link.clear_address(&address);
                self.publish_peer_list().await;
                self.refresh_phone_link(true).await;
            }
            SessionEvent::ConnectFailed { address } => {
                if self.phone_link.clear_address(&address) {
                    self.refresh_phone_link(false).await;
                }
            }
            SessionEvent::PeerDiscovered(peer) => {
                self.handle_discovered(peer).await;
            }
            SessionEvent::PeerLost { name } => {
                self.phone_link.clear_name(&name);
                self.refresh_phone_link(true).await;
            }
        }
    }

    async fn handle_discovered(&mut self, peer: DiscoveredPeer) {
        self.sinks.ui.device_discovered(&peer);

        if peer.device_type == DeviceType::Mobile {
            self.phone_link
                .hint(peer.address.to_string(), peer.name.clone());
            self.refresh_phone_link(true).await;
        }

        let manager = self.manager.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(e) = manager.connect(peer.address, peer.port).await {
                tracing::warn!("could not connect to {}: {}", peer.name, e);
                let _ = events
                    .send(SessionEvent::ConnectFailed {
                        address: peer.address.to_string(),
                    })
                    .await;
            }
        });
    }

    async fn handle_envelope(&mut self, address: &str, envelope: Envelope) {
        let sinks = &self.sinks;

        match envelope {
            Envelope::Message { content } => {
                sinks.notifications.notify(TITLE_MESSAGE, &content);
                sinks.ui.message_received(address, &content);
            }
            Envelope::File { filename, data } => {
                let sinks = sinks.clone();
                tokio::task::spawn_blocking(move || save_file(&sinks, &filename, &data));
            }
            Envelope::Clipboard { content } => {
                let sinks = sinks.clone();
                tokio::task::spawn_blocking(move || copy_to_clipboard(&sinks, &content));
            }
            Envelope::Notification { title, content } => {
                sinks
                    .notifications
                    .notify(title.as_deref().unwrap_or(TITLE_NOTIFICATION), &content);
            }
            Envelope::Command { command } => {
                tracing::info!("{} asked us to run {}", address, command);
                sinks.commands.execute(&command);
                sinks
                    .notifications
                    .notify(TITLE_COMMAND, &format!("{} dispatched.", command));
            }
            Envelope::DeviceInfo { device_type } => {
                tracing::info!("{} is a {} device", address, device_type);
                self.phone_link.clear_address(address);

                if device_type == DeviceType::Mobile {
                    if self.refresh_phone_link(true).await {
                        self.sinks.notifications.notify(TITLE_LINK, "Connected to phone!");
                    }
                } else {
                    self.refresh_phone_link(false).await;
                }
            }
            Envelope::BatteryLevel { level } => {
                sinks.ui.battery_level_changed(address, level);
            }
            Envelope::Unrecognized { kind } => {
                tracing::info!("dropping envelope of unknown type {:?} from {}", kind, address);
            }
        }
    }

    /// Recompute the link flag, pushing it to the UI when it changed or when
    /// `always_publish` is set. Returns whether it changed.
    async fn refresh_phone_link(&mut self, always_publish: bool) -> bool {
        let linked = self.phone_link.recompute(self.manager.registry()).await;
        let changed = self.phone_link.store(linked);

        if changed {
            tracing::info!("phone link {}", if linked { "up" } else { "down" });
        }
        if changed || always_publish {
            self.sinks.ui.phone_link_changed(linked);
        }
        changed
    }

    async fn publish_peer_list(&self) {
        let addresses = self.manager.registry().list().await;
        self.sinks.ui.peer_list_changed(&addresses);
    }
}

fn copy_to_clipboard(sinks: &Sinks, content: &str) {
    if let Err(e) = sinks.clipboard.write(content) {
        tracing::warn!("failed to write clipboard: {}", e);
    }
    sinks
        .notifications
        .notify(TITLE_CLIPBOARD, "Clipboard content received and copied.");
}

fn save_file(sinks: &Sinks, filename: &str, data: &[u8]) {
    let Some(path) = sinks.files.choose_destination(filename) else {
        tracing::debug!("save of {} cancelled", filename);
        return;
    };

    match sinks.files.write(&path, data) {
        Ok(()) => {
            tracing::info!("saved {} ({} bytes) to {}", filename, data.len(), path.display());
            sinks
                .notifications
                .notify(TITLE_FILE, &format!("File {} saved.", filename));
        }
        Err(e) => {
            tracing::error!("failed to save {}: {}", path.display(), e);
        }
    }
}
