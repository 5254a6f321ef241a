// Syncrypt Desktop - Daemon Supervisor
// Owns the single daemon handle: launch, stop and restart

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::process::{DaemonExit, DaemonId, DaemonProcess, DaemonSpawner};
use crate::config::{DaemonSettings, RunMode};
use crate::events::ShellHandle;
use crate::platform::Platform;

/// Daemon status for frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DaemonState {
    Absent,
    Running { id: DaemonId, pid: Option<u32> },
}

/// Why `launch` left the daemon absent (or untouched). None of these are fatal.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Daemon executable not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("Daemon #{0} is already running")]
    AlreadyRunning(DaemonId),

    #[error("Failed to spawn daemon: {0}")]
    Spawn(#[from] io::Error),
}

/// Locate the daemon binary: `<installRoot>/app/<buildSubdir>/<executable>`
/// when packaged, the configured checkout path in development
pub fn resolve_daemon_path(
    mode: RunMode,
    install_root: &Path,
    settings: &DaemonSettings,
    platform: &Platform,
) -> PathBuf {
    let path = match mode {
        RunMode::Packaged => install_root
            .join("app")
            .join(&settings.build_subdir)
            .join(&settings.executable),
        RunMode::Development => settings.dev_path.clone(),
    };
    platform.with_exe_suffix(path)
}

struct DaemonHandle {
    id: DaemonId,
    process: Box<dyn DaemonProcess>,
}

pub struct DaemonSupervisor {
    executable: PathBuf,
    spawner: Box<dyn DaemonSpawner>,
    events: ShellHandle,
    handle: Option<DaemonHandle>,
    last_id: DaemonId,
}

impl DaemonSupervisor {
    pub fn new(executable: PathBuf, spawner: Box<dyn DaemonSpawner>, events: ShellHandle) -> Self {
        Self {
            executable,
            spawner,
            events,
            handle: None,
            last_id: 0,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn state(&self) -> DaemonState {
        match &self.handle {
            Some(handle) => DaemonState::Running {
                id: handle.id,
                pid: handle.process.pid(),
            },
            None => DaemonState::Absent,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the daemon if its executable exists and none is running
    pub fn launch(&mut self) -> Result<DaemonId, LaunchError> {
        if let Some(handle) = &self.handle {
            return Err(LaunchError::AlreadyRunning(handle.id));
        }
        if !self.executable.exists() {
            return Err(LaunchError::Missing(self.executable.clone()));
        }

        let id = self.last_id + 1;
        let process = self.spawner.spawn(&self.executable, id, &self.events)?;
        self.last_id = id;

        info!(
            daemon = id,
            pid = ?process.pid(),
            "Daemon started from {}",
            self.executable.display()
        );
        self.handle = Some(DaemonHandle { id, process });
        Ok(id)
    }

    /// Terminate the daemon and wait for it to be reaped. Returns whether one was running.
    pub async fn stop(&mut self) -> bool {
        let Some(mut handle) = self.handle.take() else {
            debug!("Stop requested but no daemon is running");
            return false;
        };

        info!(daemon = handle.id, "Stopping daemon...");
        match handle.process.terminate().await {
            Ok(code) => info!(daemon = handle.id, ?code, "Daemon stopped."),
            Err(e) => warn!(daemon = handle.id, "Daemon did not stop cleanly: {}", e),
        }
        true
    }

    /// Stop, then launch. The previous process is fully reaped before the next spawn.
    pub async fn restart(&mut self) -> Result<DaemonId, LaunchError> {
        info!("Restarting daemon...");
        self.stop().await;
        self.launch()
    }

    /// Clear the handle when the current daemon exits on its own.
    /// Exits of earlier spawns are ignored.
    pub fn on_exit(&mut self, exit: DaemonExit) -> bool {
        match &self.handle {
            Some(handle) if handle.id == exit.id => {
                self.handle = None;
                info!(
                    daemon = exit.id,
                    "Daemon process exited with code {:?}",
                    exit.code
                );
                true
            }
            _ => {
                debug!(daemon = exit.id, code = ?exit.code, "Ignoring exit of a replaced daemon");
                false
            }
        }
    }
}
