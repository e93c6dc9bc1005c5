//! Info command implementation.

use hackeros_connect_core::{Config, DeviceIdentity};

use crate::config;
use crate::ui::print_field;

/// Display device information.
pub fn show_info(config: Config) {
    let identity = DeviceIdentity::new(config.device_name.clone(), config.device_type);

    println!("\n\x1b[1mHackerOS Connect Device Info\x1b[0m");
    println!("═══════════════════════════════════════");
    print_field("Name", &identity.name);
    print_field("Type", identity.device_type);
    print_field("Instance", identity.instance_id);
    print_field("Port", config.port);
    print_field("Service", &config.service_type);
    print_field("Downloads", config.download_dir.display());
    print_field("Config", config::default_path().display());
    print_field("Discovery", if config.discovery_enabled { "on" } else { "off" });

    println!("\n\x1b[1mLocal IPs:\x1b[0m");
    for ip in hackeros_connect_core::discovery::get_local_ips() {
        println!("  • {}", ip);
    }
    println!();
}
