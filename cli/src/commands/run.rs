//! Run command implementation.

use std::sync::Arc;

use hackeros_connect_core::clipboard::SystemClipboard;
use hackeros_connect_core::{Config, ConnectService, Sinks};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::console::{self, ConsoleCommand, HELP};
use crate::process::ProcessCommands;
use crate::sinks::{DesktopNotifications, DownloadDir};
use crate::ui::{format_preview, print_banner, print_field, TerminalUi};

/// Run the HackerOS Connect service until Ctrl+C or `quit`.
pub async fn run_service(config: Config) -> anyhow::Result<()> {
    print_banner();

    let sinks = Sinks {
        notifications: Arc::new(DesktopNotifications),
        files: Arc::new(DownloadDir::new(config.download_dir.clone())),
        clipboard: Arc::new(SystemClipboard::new()),
        commands: Arc::new(ProcessCommands),
        ui: Arc::new(TerminalUi),
    };

    let discovery_enabled = config.discovery_enabled;
    let mut service = ConnectService::new(config, sinks);
    service.start().await?;

    print_field("Device", &service.identity().name);
    print_field("Type", service.identity().device_type);
    if let Some(port) = service.port() {
        print_field("Port", port);
    }
    for ip in hackeros_connect_core::discovery::get_local_ips() {
        print_field("Address", ip);
    }

    if discovery_enabled {
        println!("\n\x1b[1;32m✓\x1b[0m Looking for devices on the local network...");
    } else {
        println!("\n\x1b[1;33m!\x1b[0m Discovery disabled; use 'connect <ip>' to reach a device");
    }
    println!("\x1b[2mType 'help' for commands. Press Ctrl+C to stop.\x1b[0m\n");

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = tx.blocking_send(());
    })?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = rx.recv() => {
                println!("\n\x1b[1;33mShutting down...\x1b[0m");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::debug!("stdin closed, console disabled");
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("failed to read stdin: {}", e);
                        stdin_open = false;
                        continue;
                    }
                };

                match console::parse(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(e) = execute(&service, command).await {
                            eprintln!("\x1b[1;31m✗\x1b[0m {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("\x1b[1;31m✗\x1b[0m {}", e),
                }
            }
        }
    }

    service.shutdown().await;
    Ok(())
}

async fn execute(service: &ConnectService, command: ConsoleCommand) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Peers => {
            let peers = service.peers().await;
            if peers.is_empty() {
                println!("No devices connected");
            }
            for address in peers {
                println!("  • {}", address);
            }
        }
        ConsoleCommand::Status => {
            let linked = service.is_phone_linked();
            print_field("Phone", if linked { "linked" } else { "not linked" });
            for peer in service.connections().await {
                println!(
                    "  • {} {} {:?}, up {}s",
                    peer.address,
                    peer.device_type,
                    peer.direction,
                    peer.connected_at.elapsed().as_secs()
                );
            }
        }
        ConsoleCommand::Message { address, text } => {
            service.send_message(&address, text.as_str()).await?;
            println!("\x1b[1;34m📤\x1b[0m Sent to {}: \"{}\"", address, format_preview(&text));
        }
        ConsoleCommand::File { address, path } => {
            service.send_file(&address, &path).await?;
            println!("\x1b[1;34m📤\x1b[0m Sent {} to {}", path.display(), address);
        }
        ConsoleCommand::Clipboard { address } => {
            service.send_clipboard(&address).await?;
            println!("\x1b[1;34m📋\x1b[0m Clipboard sent to {}", address);
        }
        ConsoleCommand::Command { address, command } => {
            service.send_command(&address, command.name()).await?;
            println!("\x1b[1;34m📤\x1b[0m Asked {} to {}", address, command);
        }
        ConsoleCommand::Notify { address, text } => {
            service.send_notification(&address, None, text).await?;
        }
        ConsoleCommand::Battery { address, level } => {
            service.send_battery_level(&address, level).await?;
        }
        ConsoleCommand::Connect { ip, port } => {
            service.connect(ip, port).await?;
            println!("\x1b[1;32m✓\x1b[0m Connected to {}:{}", ip, port);
        }
        ConsoleCommand::Disconnect { address } => {
            service.disconnect(&address).await?;
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}
