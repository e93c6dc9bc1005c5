//! UI utilities for terminal output.

mod banner;
mod terminal;

pub use banner::{print_banner, print_field};
pub use terminal::{format_preview, TerminalUi};
