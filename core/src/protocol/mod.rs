//! Envelope types and the wire codec

mod command;
pub mod constants;
mod envelope;

pub use command::RemoteCommand;
pub use envelope::{kind, DeviceType, Envelope};
