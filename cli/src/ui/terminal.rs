//! Session state rendered as colored terminal lines.

use hackeros_connect_core::sinks::UiSink;
use hackeros_connect_core::DiscoveredPeer;

const MAX_PREVIEW_LEN: usize = 60;

/// UI sink that prints each state change.
pub struct TerminalUi;

impl UiSink for TerminalUi {
    fn peer_list_changed(&self, addresses: &[String]) {
        if addresses.is_empty() {
            println!("\x1b[2m○ No devices connected\x1b[0m");
        } else {
            println!("\x1b[1;32m⬤\x1b[0m Connected: \x1b[1m{}\x1b[0m", addresses.join(", "));
        }
    }

    fn phone_link_changed(&self, linked: bool) {
        if linked {
            println!("\x1b[1;35m📱\x1b[0m Phone linked");
        } else {
            println!("\x1b[2m📱 Phone not linked\x1b[0m");
        }
    }

    fn message_received(&self, from: &str, text: &str) {
        println!("\x1b[1;34m💬\x1b[0m {}: \"{}\"", from, format_preview(text));
    }

    fn battery_level_changed(&self, from: &str, level: u8) {
        println!("\x1b[1;33m🔋\x1b[0m {} battery at {}%", from, level);
    }

    fn device_discovered(&self, peer: &DiscoveredPeer) {
        println!(
            "\x1b[1;36m⬤\x1b[0m Found: \x1b[1m{}\x1b[0m ({}) at {}:{}",
            peer.name, peer.device_type, peer.address, peer.port
        );
    }
}

/// Shorten text to one line for display.
pub fn format_preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let truncated = line.chars().count() > MAX_PREVIEW_LEN || text.lines().nth(1).is_some();

    let mut preview: String = line.chars().take(MAX_PREVIEW_LEN).collect();
    if truncated {
        preview.push_str("...");
    }
    preview
}
