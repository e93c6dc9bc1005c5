//! Banner and header printing.

/// Print the application banner.
pub fn print_banner() {
    println!("\n\x1b[1;36m╔══════════════════════════════════════╗\x1b[0m");
    println!("\x1b[1;36m║\x1b[0m          \x1b[1mHackerOS Connect\x1b[0m            \x1b[1;36m║\x1b[0m");
    println!("\x1b[1;36m║\x1b[0m     Your phone, on your desktop      \x1b[1;36m║\x1b[0m");
    println!("\x1b[1;36m╚══════════════════════════════════════╝\x1b[0m\n");
}

/// Print a bold label followed by a value.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("\x1b[1m{:<12}\x1b[0m {}", format!("{}:", label), value);
}
