// Syncrypt Desktop - Application Controller
// Single owner of every lifecycle handle. All transitions run on one task,
// one event at a time.

use std::ops::ControlFlow;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{RunMode, ShellSettings};
use crate::daemon::{DaemonSpawner, DaemonState, DaemonSupervisor, LaunchError};
use crate::error::ShellError;
use crate::events::{ShellEvent, ShellEvents, ShellHandle};
use crate::instance::{Activation, InstanceLock};
use crate::launch::LaunchOptions;
use crate::platform::Platform;
use crate::tray::{TrayAction, TrayController, TrayHost};
use crate::update::{UpdateCoordinator, UpdateFeed, UpdateState};
use crate::window::{WindowHost, WindowManager, WindowSpec, WindowState};

/// Process termination, provided by the platform
pub trait Lifecycle: Send {
    /// End the process after an orderly shutdown
    fn exit(&mut self, code: i32);

    /// End the process immediately, without running any cleanup
    fn abort(&mut self);
}

/// Resolved environment of this launch
#[derive(Debug, Clone)]
pub struct ShellContext {
    pub platform: Platform,
    pub mode: RunMode,
    pub launch: LaunchOptions,
    pub settings: ShellSettings,
    pub activation: Activation,
    pub daemon_path: PathBuf,
    pub tray_icon: PathBuf,
}

/// Platform collaborators the controller drives
pub struct Collaborators {
    pub lock: Box<dyn InstanceLock>,
    pub spawner: Box<dyn DaemonSpawner>,
    pub window: Box<dyn WindowHost>,
    pub tray: Box<dyn TrayHost>,
    pub updates: Box<dyn UpdateFeed>,
    pub lifecycle: Box<dyn Lifecycle>,
}

/// Snapshot for the UI layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellStatus {
    pub daemon: DaemonState,
    pub window: WindowState,
    pub update: UpdateState,
    pub tray: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Starting,
    Running,
    /// Another instance holds the lock
    Duplicate,
    ShuttingDown,
}

pub struct ShellController {
    phase: Phase,
    activation: Activation,
    check_updates: bool,
    events: ShellHandle,
    lock: Box<dyn InstanceLock>,
    supervisor: DaemonSupervisor,
    window: WindowManager,
    tray: TrayController,
    updates: UpdateCoordinator,
    lifecycle: Box<dyn Lifecycle>,
}

impl ShellController {
    pub fn new(context: ShellContext, parts: Collaborators, events: ShellHandle) -> Self {
        let hidden = context.launch.hidden;
        let check_updates = !hidden || context.settings.updates.check_when_hidden;
        let spec = WindowSpec::main(&context.platform, context.mode);

        Self {
            phase: Phase::Starting,
            activation: context.activation,
            check_updates,
            lock: parts.lock,
            supervisor: DaemonSupervisor::new(context.daemon_path, parts.spawner, events.clone()),
            window: WindowManager::new(parts.window, spec, &context.platform, hidden),
            tray: TrayController::new(parts.tray, context.tray_icon, &context.platform),
            updates: UpdateCoordinator::new(parts.updates, context.settings.updates.check_delay()),
            lifecycle: parts.lifecycle,
            events,
        }
    }

    pub fn status(&self) -> ShellStatus {
        ShellStatus {
            daemon: self.supervisor.state(),
            window: self.window.state(),
            update: self.updates.state().clone(),
            tray: self.tray.is_installed(),
        }
    }

    /// Process events until the application quits
    pub async fn run(mut self, mut inbox: ShellEvents) {
        while let Some(event) = inbox.recv().await {
            if self.dispatch(event).await.is_break() {
                break;
            }
        }
        debug!("Shell controller stopped");
    }

    pub async fn dispatch(&mut self, event: ShellEvent) -> ControlFlow<()> {
        if let ShellEvent::Status(reply) = event {
            let _ = reply.send(self.status());
            return ControlFlow::Continue(());
        }

        match self.phase {
            Phase::Starting => {
                if let ShellEvent::Ready = event {
                    return self.startup().await;
                }
                debug!("Ignoring {:?} before startup", event);
                return ControlFlow::Continue(());
            }
            Phase::Duplicate | Phase::ShuttingDown => {
                debug!("Ignoring {:?} while {:?}", event, self.phase);
                return ControlFlow::Break(());
            }
            Phase::Running => {}
        }

        match event {
            ShellEvent::Ready | ShellEvent::Status(_) => {}
            ShellEvent::Activate => {
                if !self.window.exists() {
                    self.open_window();
                }
            }
            ShellEvent::SecondInstance(activation) => {
                info!("Second launch attempted with {:?}", activation.args);
                self.window.bring_to_front();
            }
            ShellEvent::AllWindowsClosed => {
                debug!("All windows closed, staying resident in the tray");
            }
            ShellEvent::WindowLoaded => self.window.on_loaded(),
            ShellEvent::WindowClosed => self.window.on_closed(),
            ShellEvent::Tray(TrayAction::Open) | ShellEvent::TrayDoubleClick => self.open_window(),
            ShellEvent::Tray(TrayAction::RestartDaemon) => {
                let result = self.supervisor.restart().await;
                log_launch(result);
            }
            ShellEvent::Tray(TrayAction::StopDaemon) => {
                self.supervisor.stop().await;
            }
            ShellEvent::Tray(TrayAction::Quit) | ShellEvent::Quit => {
                self.shutdown(0).await;
                return ControlFlow::Break(());
            }
            ShellEvent::DaemonExited(exit) => {
                self.supervisor.on_exit(exit);
            }
            ShellEvent::UpdateCheckDue => self.updates.check_now(),
            ShellEvent::Update(update) => {
                if let Some(notification) = self.updates.on_event(update) {
                    self.window.notify(notification);
                }
            }
            ShellEvent::InstallRequested => self.quit_and_install().await,
        }
        ControlFlow::Continue(())
    }

    /// Lock, daemon, window, tray, update timer; in that order
    async fn startup(&mut self) -> ControlFlow<()> {
        match self.lock.acquire(&self.activation).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Syncrypt is already running, handed over to it");
                self.phase = Phase::Duplicate;
                self.lifecycle.abort();
                return ControlFlow::Break(());
            }
            Err(e) => {
                error!("{}", ShellError::InstanceLock(e));
                self.phase = Phase::Duplicate;
                self.lifecycle.abort();
                return ControlFlow::Break(());
            }
        }

        log_launch(self.supervisor.launch());
        self.open_window();

        if let Err(e) = self.tray.install() {
            error!("Startup failed: {}", e);
            self.shutdown(1).await;
            return ControlFlow::Break(());
        }

        if self.check_updates {
            self.updates.schedule(&self.events);
        } else {
            info!("Hidden launch, skipping update check");
        }

        self.phase = Phase::Running;
        info!("Syncrypt shell started");
        ControlFlow::Continue(())
    }

    fn open_window(&mut self) {
        if let Err(e) = self.window.create_window() {
            error!("Failed to open main window: {}", e);
        }
    }

    /// Stop the daemon, then let the updater replace the binary
    async fn quit_and_install(&mut self) {
        let version = match self.updates.begin_install() {
            Ok(version) => version,
            Err(e) => {
                warn!("Ignoring install request: {}", e);
                return;
            }
        };

        info!("Installing update {}", version);
        self.supervisor.stop().await;
        if let Err(e) = self.updates.install() {
            error!("{}", e);
        }
    }

    async fn shutdown(&mut self, code: i32) {
        info!("Shutting down...");
        self.phase = Phase::ShuttingDown;
        self.updates.cancel();
        self.supervisor.stop().await;
        self.window.close();
        self.lifecycle.exit(code);
    }
}

fn log_launch(result: Result<crate::daemon::DaemonId, LaunchError>) {
    match result {
        Ok(_) => {}
        Err(LaunchError::Missing(path)) => {
            warn!(
                "Daemon executable not found at {}, continuing without daemon",
                path.display()
            )
        }
        Err(e) => warn!("{}", e),
    }
}
