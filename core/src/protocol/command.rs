//! Remote command vocabulary

use std::fmt;
use std::str::FromStr;

/// Commands a peer may ask this host to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    Shutdown,
    Lock,
    VolumeUp,
    VolumeDown,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 4] = [
        RemoteCommand::Shutdown,
        RemoteCommand::Lock,
        RemoteCommand::VolumeUp,
        RemoteCommand::VolumeDown,
    ];

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCommand::Shutdown => "shutdown",
            RemoteCommand::Lock => "lock",
            RemoteCommand::VolumeUp => "volume-up",
            RemoteCommand::VolumeDown => "volume-down",
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RemoteCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| format!("unknown command: {}", s))
    }
}
