// Recording fakes for the platform collaborators

use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::{RunMode, ShellSettings};
use crate::controller::{Collaborators, Lifecycle, ShellContext, ShellController};
use crate::daemon::{DaemonId, DaemonProcess, DaemonSpawner};
use crate::error::ShellError;
use crate::events::{shell_channel, ShellEvent, ShellEvents, ShellHandle};
use crate::instance::{Activation, InstanceLock};
use crate::launch::LaunchOptions;
use crate::platform::{Os, Platform};
use crate::tray::{TrayHost, TraySpec};
use crate::update::{UpdateError, UpdateFeed};
use crate::window::{UiEvent, WindowHost, WindowSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LockAcquire,
    Spawn(DaemonId),
    Terminate(DaemonId),
    WindowCreate,
    Show,
    Focus,
    Restore,
    Close,
    Devtools,
    Dock(bool),
    /// Event name and version payload
    Emit(String, String),
    TrayInstall { double_click: bool },
    UpdateCheck,
    Install,
    Exit(i32),
    Abort,
}

#[derive(Default)]
struct Log {
    calls: Vec<Call>,
    alive: usize,
    peak_alive: usize,
}

/// Shared call log across all fakes of one test
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Log>>,
}

impl Recorder {
    pub fn push(&self, call: Call) {
        let mut log = self.log.lock().unwrap();
        match call {
            Call::Spawn(_) => {
                log.alive += 1;
                log.peak_alive = log.peak_alive.max(log.alive);
            }
            Call::Terminate(_) => log.alive = log.alive.saturating_sub(1),
            _ => {}
        }
        log.calls.push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    /// Daemons spawned and not yet terminated
    pub fn alive(&self) -> usize {
        self.log.lock().unwrap().alive
    }

    pub fn peak_alive(&self) -> usize {
        self.log.lock().unwrap().peak_alive
    }
}

/// How the fake instance lock answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    /// Another instance holds the lock
    Held,
    Failed,
}

pub struct FakeLock {
    recorder: Recorder,
    outcome: LockOutcome,
}

#[async_trait]
impl InstanceLock for FakeLock {
    async fn acquire(&mut self, _activation: &Activation) -> io::Result<bool> {
        self.recorder.push(Call::LockAcquire);
        match self.outcome {
            LockOutcome::Acquired => Ok(true),
            LockOutcome::Held => Ok(false),
            LockOutcome::Failed => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "lock unavailable",
            )),
        }
    }
}

pub struct FakeSpawner {
    recorder: Recorder,
}

impl FakeSpawner {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl DaemonSpawner for FakeSpawner {
    fn spawn(
        &mut self,
        _path: &Path,
        id: DaemonId,
        _events: &ShellHandle,
    ) -> io::Result<Box<dyn DaemonProcess>> {
        self.recorder.push(Call::Spawn(id));
        Ok(Box::new(FakeProcess {
            recorder: self.recorder.clone(),
            id,
        }))
    }
}

struct FakeProcess {
    recorder: Recorder,
    id: DaemonId,
}

#[async_trait]
impl DaemonProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(1000 + self.id as u32)
    }

    async fn terminate(&mut self) -> io::Result<Option<i32>> {
        self.recorder.push(Call::Terminate(self.id));
        Ok(None)
    }
}

pub struct FakeWindow {
    recorder: Recorder,
    fail_create: bool,
}

impl FakeWindow {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            fail_create: false,
        }
    }

    pub fn failing(recorder: Recorder) -> Self {
        Self {
            recorder,
            fail_create: true,
        }
    }

    fn record(&self, call: Call) -> Result<(), ShellError> {
        self.recorder.push(call);
        Ok(())
    }
}

impl WindowHost for FakeWindow {
    fn create(&mut self, _spec: &WindowSpec) -> Result<(), ShellError> {
        if self.fail_create {
            return Err(ShellError::Window("webview unavailable".into()));
        }
        self.record(Call::WindowCreate)
    }

    fn show(&mut self) -> Result<(), ShellError> {
        self.record(Call::Show)
    }

    fn focus(&mut self) -> Result<(), ShellError> {
        self.record(Call::Focus)
    }

    fn restore(&mut self) -> Result<(), ShellError> {
        self.record(Call::Restore)
    }

    fn close(&mut self) -> Result<(), ShellError> {
        self.record(Call::Close)
    }

    fn open_devtools(&mut self) -> Result<(), ShellError> {
        self.record(Call::Devtools)
    }

    fn set_dock_visible(&mut self, visible: bool) -> Result<(), ShellError> {
        self.record(Call::Dock(visible))
    }

    fn emit(&mut self, event: &UiEvent) -> Result<(), ShellError> {
        let version = event.payload()["version"].as_str().unwrap_or_default().to_string();
        self.record(Call::Emit(event.name().to_string(), version))
    }
}

pub struct FakeTray {
    recorder: Recorder,
}

impl FakeTray {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl TrayHost for FakeTray {
    fn install(&mut self, spec: &TraySpec) -> Result<(), ShellError> {
        self.recorder.push(Call::TrayInstall {
            double_click: spec.double_click_opens,
        });
        Ok(())
    }
}

pub struct FakeFeed {
    recorder: Recorder,
}

impl FakeFeed {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl UpdateFeed for FakeFeed {
    fn check(&mut self) {
        self.recorder.push(Call::UpdateCheck);
    }

    fn quit_and_install(&mut self) -> Result<(), UpdateError> {
        self.recorder.push(Call::Install);
        Ok(())
    }
}

pub struct FakeLifecycle {
    recorder: Recorder,
}

impl Lifecycle for FakeLifecycle {
    fn exit(&mut self, code: i32) {
        self.recorder.push(Call::Exit(code));
    }

    fn abort(&mut self) {
        self.recorder.push(Call::Abort);
    }
}

pub struct FixtureOptions {
    pub os: Os,
    pub lock: LockOutcome,
    pub daemon_present: bool,
    pub tray_icon_present: bool,
    pub hidden: bool,
    pub check_when_hidden: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            os: Os::Linux,
            lock: LockOutcome::Acquired,
            daemon_present: true,
            tray_icon_present: true,
            hidden: false,
            check_when_hidden: true,
        }
    }
}

/// A controller wired to fakes, with its inbox exposed to the test
pub struct Fixture {
    pub controller: ShellController,
    pub recorder: Recorder,
    pub events: ShellEvents,
    daemon_path: PathBuf,
    _dir: TempDir,
}

impl Fixture {
    pub fn new(options: FixtureOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let daemon_path = dir.path().join("syncrypt_daemon");
        let tray_icon = dir.path().join("tray.png");
        if options.daemon_present {
            std::fs::write(&daemon_path, b"").unwrap();
        }
        if options.tray_icon_present {
            std::fs::write(&tray_icon, b"png").unwrap();
        }

        let mut settings = ShellSettings::default();
        settings.updates.check_when_hidden = options.check_when_hidden;

        let context = ShellContext {
            platform: Platform::for_os(options.os),
            mode: RunMode::Packaged,
            launch: LaunchOptions {
                hidden: options.hidden,
            },
            settings,
            activation: Activation::default(),
            daemon_path: daemon_path.clone(),
            tray_icon,
        };

        let recorder = Recorder::default();
        let parts = Collaborators {
            lock: Box::new(FakeLock {
                recorder: recorder.clone(),
                outcome: options.lock,
            }),
            spawner: Box::new(FakeSpawner::new(recorder.clone())),
            window: Box::new(FakeWindow::new(recorder.clone())),
            tray: Box::new(FakeTray::new(recorder.clone())),
            updates: Box::new(FakeFeed::new(recorder.clone())),
            lifecycle: Box::new(FakeLifecycle {
                recorder: recorder.clone(),
            }),
        };

        let (handle, events) = shell_channel();
        Self {
            controller: ShellController::new(context, parts, handle),
            recorder,
            events,
            daemon_path,
            _dir: dir,
        }
    }

    /// Constructed and past the startup sequence
    pub async fn started(options: FixtureOptions) -> Self {
        let mut fixture = Self::new(options);
        fixture.send(ShellEvent::Ready).await;
        fixture
    }

    pub async fn send(&mut self, event: ShellEvent) -> ControlFlow<()> {
        self.controller.dispatch(event).await
    }

    /// Make the daemon binary appear after startup
    pub fn install_daemon(&self) {
        std::fs::write(&self.daemon_path, b"").unwrap();
    }
}
