//! Spawning the target application.

use std::process::{Command, Stdio};
use std::thread;

use super::resolve::LaunchCommand;
use crate::error::DispatchError;

/// Starts a launch command without waiting for the application to exit.
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &LaunchCommand) -> Result<(), DispatchError>;
}

/// Spawns the command as a detached child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, command: &LaunchCommand) -> Result<(), DispatchError> {
        tracing::info!("executing command: {}", command);
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| DispatchError::Launch {
                command: command.to_string(),
                source,
            })?;

        // Reap in the background so the dispatch worker never waits on the child.
        let program = command.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::warn!("{} exited with {}", program, status)
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("wait for {} failed: {}", program, e),
        });
        Ok(())
    }
}
