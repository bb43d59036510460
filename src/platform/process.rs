//! Launching the external downloader through the command shell
//!
//! Launches are fire-and-forget: the child is detached as soon as it
//! spawns and nobody waits for it.

use std::process::Command;

use crate::domain::download::DownloadJob;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to start `{command_line}`: {source}")]
    Spawn {
        command_line: String,
        source: std::io::Error,
    },
}

/// Starts one downloader process per job
pub trait Launcher {
    /// `visible` keeps the shell window on screen
    fn launch(&mut self, job: &DownloadJob, visible: bool) -> Result<(), LaunchError>;
}

/// Runs jobs via `cmd.exe /C` on Windows and `sh -c` elsewhere
#[derive(Debug, Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str, visible: bool) -> Command {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let mut command = Command::new("cmd.exe");
    // /S strips the outer quotes and keeps the inner ones intact
    command.raw_arg(format!("/S /C \"{command_line}\""));
    command.creation_flags(if visible { CREATE_NEW_CONSOLE } else { CREATE_NO_WINDOW });
    command
}

#[cfg(not(windows))]
fn shell_command(command_line: &str, _visible: bool) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

impl Launcher for ShellLauncher {
    fn launch(&mut self, job: &DownloadJob, visible: bool) -> Result<(), LaunchError> {
        let mut command = shell_command(&job.command_line, visible);
        if job.target_dir.is_dir() {
            command.current_dir(&job.target_dir);
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            command_line: job.command_line.clone(),
            source,
        })?;
        tracing::debug!(pid = child.id(), "spawned `{}`", job.command_line);
        Ok(())
    }
}
