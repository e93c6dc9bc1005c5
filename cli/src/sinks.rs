//! Desktop implementations of the session sinks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hackeros_connect_core::sinks::{FileSink, NotificationSink};
use notify_rust::{Notification, Timeout};

const APP_NAME: &str = "HackerOS Connect";
const TIMEOUT_MS: u32 = 5000;

/// Freedesktop / platform notifications via notify-rust.
pub struct DesktopNotifications;

impl NotificationSink for DesktopNotifications {
    fn notify(&self, title: &str, body: &str) {
        tracing::debug!("notification: {} - {}", title, body);

        let title = title.to_string();
        let body = body.to_string();
        // show() talks to the notification daemon synchronously
        tokio::task::spawn_blocking(move || {
            if let Err(e) = Notification::new()
                .appname(APP_NAME)
                .summary(&title)
                .body(&body)
                .timeout(Timeout::Milliseconds(TIMEOUT_MS))
                .show()
            {
                tracing::warn!("failed to show notification: {}", e);
            }
        });
    }
}

/// Saves received files into one directory without overwriting anything.
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FileSink for DownloadDir {
    fn choose_destination(&self, suggested_name: &str) -> Option<PathBuf> {
        let name = sanitize_filename(suggested_name);
        Some(unique_path(&self.dir, &name))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }
}

/// Reduce a sender-supplied name to a plain file name.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();

    match cleaned.trim_start_matches('.') {
        "" => "received-file".to_string(),
        _ => cleaned,
    }
}

/// `dir/name`, or `dir/stem (n).ext` for the first n that is free.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
