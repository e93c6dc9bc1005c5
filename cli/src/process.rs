//! Remote command execution.

use std::process::Command;

use hackeros_connect_core::sinks::CommandSink;
use hackeros_connect_core::RemoteCommand;

/// Runs remote commands as local OS commands.
pub struct ProcessCommands;

impl ProcessCommands {
    /// Program and arguments for `command` on this platform.
    pub fn program_for(command: RemoteCommand) -> (&'static str, &'static [&'static str]) {
        if cfg!(target_os = "macos") {
            match command {
                RemoteCommand::Shutdown => ("osascript", &["-e", "tell app \"System Events\" to shut down"]),
                RemoteCommand::Lock => ("pmset", &["displaysleepnow"]),
                RemoteCommand::VolumeUp => ("osascript", &["-e", "set volume output volume ((output volume of (get volume settings)) + 5)"]),
                RemoteCommand::VolumeDown => ("osascript", &["-e", "set volume output volume ((output volume of (get volume settings)) - 5)"]),
            }
        } else if cfg!(windows) {
            match command {
                RemoteCommand::Shutdown => ("shutdown", &["/s", "/t", "0"]),
                RemoteCommand::Lock => ("rundll32.exe", &["user32.dll,LockWorkStation"]),
                RemoteCommand::VolumeUp => ("nircmd", &["changesysvolume", "3277"]),
                RemoteCommand::VolumeDown => ("nircmd", &["changesysvolume", "-3277"]),
            }
        } else {
            match command {
                RemoteCommand::Shutdown => ("shutdown", &["now"]),
                RemoteCommand::Lock => ("loginctl", &["lock-session"]),
                RemoteCommand::VolumeUp => ("amixer", &["set", "Master", "5%+"]),
                RemoteCommand::VolumeDown => ("amixer", &["set", "Master", "5%-"]),
            }
        }
    }
}

impl CommandSink for ProcessCommands {
    fn execute(&self, command: &str) {
        let command: RemoteCommand = match command.parse() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("ignoring command: {}", e);
                return;
            }
        };

        let (program, args) = Self::program_for(command);
        match Command::new(program).args(args).spawn() {
            Ok(child) => tracing::info!("{} started as pid {}", command, child.id()),
            Err(e) => tracing::error!("failed to run {} for {}: {}", program, command, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_a_program() {
        for command in RemoteCommand::ALL {
            let (program, args) = ProcessCommands::program_for(command);
            assert!(!program.is_empty());
            assert!(!args.is_empty());
        }
    }

    #[test]
    fn test_unknown_command_is_ignored() {
        ProcessCommands.execute("self-destruct");
    }
}
