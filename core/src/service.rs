//! High-level HackerOS Connect service that coordinates all components

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::connection::{ConnectionManager, ConnectionState, ListenerHandle, Peer};
use crate::discovery::DiscoveryService;
use crate::protocol::constants::EVENT_CHANNEL_CAPACITY;
use crate::protocol::Envelope;
use crate::session::{Dispatcher, SessionEvent};
use crate::sinks::Sinks;
use crate::{Config, DeviceIdentity, Error, Result};

/// Main HackerOS Connect service.
///
/// Owns the listener, the discovery daemon and the dispatcher task, and is
/// the entry point for every user-initiated action.
pub struct ConnectService {
    config: Config,
    identity: DeviceIdentity,
    sinks: Sinks,
    manager: ConnectionManager,
    events: mpsc::Sender<SessionEvent>,
    pending: Option<(Dispatcher, mpsc::Receiver<SessionEvent>)>,
    phone_link: watch::Receiver<bool>,
    shutdown: CancellationToken,
    listener: Option<ListenerHandle>,
    discovery: Option<Arc<DiscoveryService>>,
}

impl ConnectService {
    pub fn new(config: Config, sinks: Sinks) -> Self {
        let identity = DeviceIdentity::new(config.device_name.clone(), config.device_type);
        let shutdown = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let manager = ConnectionManager::new(
            config.device_type,
            config.max_envelope_size,
            tx.clone(),
            shutdown.clone(),
        );
        let (dispatcher, phone_link) = Dispatcher::new(manager.clone(), sinks.clone(), tx.clone());

        Self {
            config,
            identity,
            sinks,
            manager,
            events: tx,
            pending: Some((dispatcher, rx)),
            phone_link,
            shutdown,
            listener: None,
            discovery: None,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Port the listener is bound to, once started
    pub fn port(&self) -> Option<u16> {
        self.listener.as_ref().map(|l| l.port())
    }

    /// Bind the listener, start discovery and the dispatcher.
    ///
    /// Only a bind failure is fatal; discovery problems are logged and the
    /// service keeps accepting direct connections.
    pub async fn start(&mut self) -> Result<()> {
        let Some((dispatcher, rx)) = self.pending.take() else {
            return Err(Error::Network("service already started".to_string()));
        };

        let listener = self.manager.listen(self.config.port).await?;
        let port = listener.port();
        self.listener = Some(listener);

        tokio::spawn(dispatcher.run(rx, self.shutdown.clone()));

        if self.config.discovery_enabled {
            if let Err(e) = self.start_discovery(port) {
                tracing::warn!("discovery unavailable: {}", e);
            }
        }

        tracing::info!("hackeros connect service started on port {}", port);
        Ok(())
    }

    fn start_discovery(&mut self, port: u16) -> Result<()> {
        let discovery = Arc::new(DiscoveryService::new(
            self.identity.clone(),
            &self.config.service_type,
            &self.config.service_id,
            port,
        )?);
        // held from here on so shutdown withdraws the record even if browsing fails
        self.discovery = Some(discovery.clone());

        tokio::spawn(advertise_with_retry(
            discovery.clone(),
            Duration::from_secs(self.config.advertise_retry_secs),
            self.config.advertise_max_attempts,
            self.shutdown.clone(),
        ));

        discovery.browse(self.events.clone(), self.shutdown.clone())?;
        Ok(())
    }

    /// Addresses of live peers, most recently connected first
    pub async fn peers(&self) -> Vec<String> {
        self.manager.registry().list().await
    }

    /// Live peers with their connection details
    pub async fn connections(&self) -> Vec<Peer> {
        self.manager.registry().snapshot().await
    }

    pub async fn connection_state(&self, address: &str) -> ConnectionState {
        self.manager.connection_state(address).await
    }

    pub fn is_phone_linked(&self) -> bool {
        *self.phone_link.borrow()
    }

    /// Subscribe to phone-link changes
    pub fn phone_link(&self) -> watch::Receiver<bool> {
        self.phone_link.clone()
    }

    pub async fn send_message(&self, address: &str, text: impl Into<String>) -> Result<()> {
        self.manager.send(address, &Envelope::message(text)).await
    }

    /// Send a file from disk; the peer sees only its base name
    pub async fn send_file(&self, address: &str, path: &Path) -> Result<()> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} is not a file", path.display()),
                ))
            })?;
        let data = tokio::fs::read(path).await?;

        tracing::info!("sending {} ({} bytes) to {}", filename, data.len(), address);
        self.manager.send(address, &Envelope::file(filename, data)).await
    }

    /// Send the current contents of the local clipboard
    pub async fn send_clipboard(&self, address: &str) -> Result<()> {
        let clipboard = self.sinks.clipboard.clone();
        let content = tokio::task::spawn_blocking(move || clipboard.read())
            .await
            .map_err(|e| Error::Clipboard(e.to_string()))??;

        self.manager
            .send(address, &Envelope::Clipboard { content })
            .await
    }

    pub async fn send_command(&self, address: &str, command: impl Into<String>) -> Result<()> {
        let envelope = Envelope::Command {
            command: command.into(),
        };
        self.manager.send(address, &envelope).await
    }

    pub async fn send_notification(
        &self,
        address: &str,
        title: Option<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        let envelope = Envelope::Notification {
            title,
            content: content.into(),
        };
        self.manager.send(address, &envelope).await
    }

    pub async fn send_battery_level(&self, address: &str, level: u8) -> Result<()> {
        self.manager
            .send(address, &Envelope::BatteryLevel { level })
            .await
    }

    /// Connect to a peer by hand, bypassing discovery
    pub async fn connect(&self, ip: IpAddr, port: u16) -> Result<()> {
        self.manager.connect(ip, port).await
    }

    pub async fn disconnect(&self, address: &str) -> Result<()> {
        self.manager.disconnect(address).await
    }

    /// Stop everything: listener, receive loops, dispatcher and discovery
    pub async fn shutdown(&mut self) {
        tracing::info!("shutting down");
        self.shutdown.cancel();
        self.manager.shutdown().await;

        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Some(discovery) = self.discovery.take() {
            discovery.shutdown();
        }
    }
}

async fn advertise_with_retry(
    discovery: Arc<DiscoveryService>,
    delay: Duration,
    max_attempts: u32,
    shutdown: CancellationToken,
) {
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match discovery.advertise() {
            Ok(()) => return,
            Err(e) => tracing::warn!("advertisement attempt {} failed: {}", attempt, e),
        }
        if attempt == max_attempts {
            break;
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    tracing::error!("giving up on advertising after {} attempts", max_attempts);
}
