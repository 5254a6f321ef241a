// Syncrypt Desktop - Error Types

use std::path::PathBuf;

use thiserror::Error;

use crate::update::UpdateError;

/// Top-level error type for the lifecycle core
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to load tray icon from {}: {reason}", .path.display())]
    TrayIcon { path: PathBuf, reason: String },

    #[error("Tray error: {0}")]
    Tray(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Single-instance lock failed: {0}")]
    InstanceLock(#[source] std::io::Error),

    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    #[error("Daemon config error: {0}")]
    DaemonConfig(String),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
