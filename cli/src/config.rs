//! Config file loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use hackeros_connect_core::Config;

/// Default location of the config file.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("hackeros-connect")
        .join("config.toml")
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default path is read when
/// present and built-in defaults are used otherwise.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_path(), false),
    };

    if !required && !path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn parse(contents: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hackeros_connect_core::protocol::DeviceType;

    #[test]
    fn test_parse_partial_file() {
        let config = parse(
            r#"
            port = 9001
            device_name = "battlestation"
            discovery_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9001);
        assert_eq!(config.device_name, "battlestation");
        assert!(!config.discovery_enabled);
        assert_eq!(config.device_type, DeviceType::Desktop);
        assert_eq!(config.service_type, "_hackeros-connect._tcp.local.");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(parse("port = \"eighty\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = std::env::temp_dir().join("hackeros-connect-no-such-config.toml");
        assert!(load(Some(&missing)).is_err());
    }
}
