//! Host-side collaborators the session calls into
//!
//! Rendering notifications, saving files, touching the clipboard, running
//! commands and drawing UI all belong to the embedding application. The
//! session only sees these traits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::discovery::DiscoveredPeer;
use crate::Result;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Where received files go.
///
/// Called from a blocking thread, so implementations may prompt the user.
pub trait FileSink: Send + Sync {
    /// Pick a destination for `suggested_name`; `None` means the user cancelled
    fn choose_destination(&self, suggested_name: &str) -> Option<PathBuf>;

    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// System clipboard access.
///
/// Both methods are called from a blocking thread; clipboard backends may
/// wait on the display server.
pub trait ClipboardSink: Send + Sync {
    fn write(&self, text: &str) -> Result<()>;

    fn read(&self) -> Result<String>;
}

pub trait CommandSink: Send + Sync {
    /// Run a named command; unknown names are logged and ignored
    fn execute(&self, command: &str);
}

/// State pushes for whatever is rendering the session
pub trait UiSink: Send + Sync {
    fn peer_list_changed(&self, addresses: &[String]);

    fn phone_link_changed(&self, linked: bool);

    fn message_received(&self, from: &str, text: &str);

    fn battery_level_changed(&self, from: &str, level: u8);

    fn device_discovered(&self, _peer: &DiscoveredPeer) {}
}

/// The full set of collaborators a session needs
#[derive(Clone)]
pub struct Sinks {
    pub notifications: Arc<dyn NotificationSink>,
    pub files: Arc<dyn FileSink>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub commands: Arc<dyn CommandSink>,
    pub ui: Arc<dyn UiSink>,
}
