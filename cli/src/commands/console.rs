//! Interactive console commands read from stdin.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use hackeros_connect_core::protocol::constants::DEFAULT_PORT;
use hackeros_connect_core::RemoteCommand;

pub const HELP: &str = "\
Commands:
  peers                          list connected devices
  status                         show phone link and connection details
  msg <addr> <text>              send a chat message
  file <addr> <path>             send a file
  clip <addr>                    send this machine's clipboard
  cmd <addr> <command>           run shutdown | lock | volume-up | volume-down
  notify <addr> <text>           show a notification on the device
  battery <addr> <0-100>         report a battery level
  connect <ip> [port]            connect without discovery
  disconnect <addr>              close a connection
  help                           show this help
  quit                           stop the service";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Peers,
    Status,
    Message { address: String, text: String },
    File { address: String, path: PathBuf },
    Clipboard { address: String },
    Command { address: String, command: RemoteCommand },
    Notify { address: String, text: String },
    Battery { address: String, level: u8 },
    Connect { ip: IpAddr, port: u16 },
    Disconnect { address: String },
    Help,
    Quit,
}

/// Parse one console line; blank lines yield `None`.
pub fn parse(line: &str) -> anyhow::Result<Option<ConsoleCommand>> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "" => return Ok(None),
        "peers" | "ls" => ConsoleCommand::Peers,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        "msg" => {
            let (address, text) = address_and_rest(rest, "msg <addr> <text>")?;
            ConsoleCommand::Message { address, text }
        }
        "file" => {
            let (address, path) = address_and_rest(rest, "file <addr> <path>")?;
            ConsoleCommand::File { address, path: PathBuf::from(path) }
        }
        "clip" => ConsoleCommand::Clipboard { address: single(rest, "clip <addr>")? },
        "cmd" => {
            let (address, name) = address_and_rest(rest, "cmd <addr> <command>")?;
            let command = name.parse::<RemoteCommand>().map_err(|e| anyhow!(e))?;
            ConsoleCommand::Command { address, command }
        }
        "notify" => {
            let (address, text) = address_and_rest(rest, "notify <addr> <text>")?;
            ConsoleCommand::Notify { address, text }
        }
        "battery" => {
            let (address, level) = address_and_rest(rest, "battery <addr> <0-100>")?;
            let level: u8 = level.parse().context("battery level must be a number")?;
            if level > 100 {
                bail!("battery level must be between 0 and 100");
            }
            ConsoleCommand::Battery { address, level }
        }
        "connect" => {
            let mut parts = rest.split_whitespace();
            let ip = parts
                .next()
                .ok_or_else(|| anyhow!("usage: connect <ip> [port]"))?
                .parse::<IpAddr>()
                .context("not an IP address")?;
            let port = match parts.next() {
                Some(p) => p.parse().context("not a port number")?,
                None => DEFAULT_PORT,
            };
            ConsoleCommand::Connect { ip, port }
        }
        "disconnect" => ConsoleCommand::Disconnect {
            address: single(rest, "disconnect <addr>")?,
        },
        other => bail!("unknown command '{}', try 'help'", other),
    };

    Ok(Some(command))
}

fn address_and_rest(rest: &str, usage: &str) -> anyhow::Result<(String, String)> {
    match rest.split_once(char::is_whitespace) {
        Some((address, tail)) if !tail.trim().is_empty() => {
            Ok((address.to_string(), tail.trim().to_string()))
        }
        _ => bail!("usage: {}", usage),
    }
}

fn single(rest: &str, usage: &str) -> anyhow::Result<String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [address] => Ok(address.to_string()),
        _ => bail!("usage: {}", usage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> ConsoleCommand {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_message_keeps_spaces() {
        assert_eq!(
            parsed("msg 192.168.1.40  see you at 8 "),
            ConsoleCommand::Message {
                address: "192.168.1.40".to_string(),
                text: "see you at 8".to_string(),
            }
        );
    }

    #[test]
    fn test_remote_command_names() {
        assert_eq!(
            parsed("cmd 10.0.0.3 volume-down"),
            ConsoleCommand::Command {
                address: "10.0.0.3".to_string(),
                command: RemoteCommand::VolumeDown,
            }
        );
        assert!(parse("cmd 10.0.0.3 reboot").is_err());
    }

    #[test]
    fn test_connect_defaults_port() {
        assert_eq!(
            parsed("connect 10.0.0.3"),
            ConsoleCommand::Connect { ip: "10.0.0.3".parse().unwrap(), port: 8765 }
        );
        assert_eq!(
            parsed("connect 10.0.0.3 9000"),
            ConsoleCommand::Connect { ip: "10.0.0.3".parse().unwrap(), port: 9000 }
        );
        assert!(parse("connect phone.local").is_err());
    }

    #[test]
    fn test_battery_range() {
        assert_eq!(
            parsed("battery 10.0.0.3 100"),
            ConsoleCommand::Battery { address: "10.0.0.3".to_string(), level: 100 }
        );
        assert!(parse("battery 10.0.0.3 101").is_err());
        assert!(parse("battery 10.0.0.3 full").is_err());
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse("msg 10.0.0.3").is_err());
        assert!(parse("clip").is_err());
        assert!(parse("disconnect a b").is_err());
        assert!(parse("teleport").is_err());
    }

    #[test]
    fn test_simple_verbs() {
        assert_eq!(parsed("peers"), ConsoleCommand::Peers);
        assert_eq!(parsed("status"), ConsoleCommand::Status);
        assert_eq!(parsed("help"), ConsoleCommand::Help);
        assert_eq!(parsed("quit"), ConsoleCommand::Quit);
        assert_eq!(
            parsed("file 10.0.0.3 /tmp/report final.pdf"),
            ConsoleCommand::File {
                address: "10.0.0.3".to_string(),
                path: PathBuf::from("/tmp/report final.pdf"),
            }
        );
    }
}
