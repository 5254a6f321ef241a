// Syncrypt Desktop - Daemon Management
// Spawning, supervision and the local files/APIs the daemon exposes

pub mod auth;
pub mod health;
pub mod process;
pub mod supervisor;

pub use auth::{parse_auth_token, read_auth_token};
pub use health::{probe_api, ApiProbe};
pub use process::{DaemonExit, DaemonId, DaemonProcess, DaemonSpawner, TokioSpawner};
pub use supervisor::{resolve_daemon_path, DaemonState, DaemonSupervisor, LaunchError};
