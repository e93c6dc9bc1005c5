//! HackerOS Connect CLI - desktop companion daemon.

mod commands;
mod config;
mod process;
mod sinks;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hackeros-connect")]
#[command(about = "Connect this desktop to your phone over the local network", long_about = None)]
struct Cli {
    /// Device name to advertise
    #[arg(short, long)]
    name: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file (defaults to <config dir>/hackeros-connect/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not advertise or browse over mDNS
    #[arg(long)]
    no_discovery: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service (default)
    Run,
    /// Show device info
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hackeros_connect=info".parse()?)
                .add_directive("mdns_sd=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(name) = cli.name {
        config.device_name = name;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.no_discovery {
        config.discovery_enabled = false;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run_service(config).await?,
        Commands::Info => commands::show_info(config),
    }

    Ok(())
}
