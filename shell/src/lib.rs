// Syncrypt Desktop - Lifecycle Core
// Supervises the daemon, guards the single instance and drives the window,
// tray and updater collaborators from one event-loop actor.

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod events;
pub mod instance;
pub mod launch;
pub mod platform;
pub mod tray;
pub mod update;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::UiBootstrap;
pub use config::{RunMode, ShellSettings};
pub use controller::{Collaborators, Lifecycle, ShellContext, ShellController, ShellStatus};
pub use daemon::{DaemonExit, DaemonId, DaemonState, DaemonSupervisor, TokioSpawner};
pub use error::ShellError;
pub use events::{shell_channel, ShellEvent, ShellEvents, ShellHandle};
pub use instance::{Activation, InstanceLock};
pub use launch::LaunchOptions;
pub use platform::{Os, Platform};
pub use tray::{TrayAction, TrayHost, TraySpec};
pub use update::{UpdateEvent, UpdateFeed, UpdateState};
pub use window::{UiEvent, WindowHost, WindowSpec, WindowState};
