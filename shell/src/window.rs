// Syncrypt Desktop - Window Lifecycle
// At most one main window: created lazily, revealed once its content has
// loaded, reused instead of duplicated.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::RunMode;
use crate::error::ShellError;
use crate::platform::Platform;

pub const MAIN_WINDOW: &str = "main";

/// How to build the main window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub label: &'static str,
    pub title: &'static str,
    /// Page loaded from the bundled UI
    pub entry: &'static str,
    pub size: (f64, f64),
    pub min_size: (f64, f64),
    /// Open inspection tooling (development only)
    pub devtools: bool,
}

impl WindowSpec {
    pub fn main(platform: &Platform, mode: RunMode) -> Self {
        Self {
            label: MAIN_WINDOW,
            title: "Syncrypt",
            entry: "index.html",
            size: platform.window_size,
            min_size: platform.min_window_size,
            devtools: mode.is_development(),
        }
    }
}

/// One-way notifications pushed to the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    UpdateDownloaded { version: String },
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::UpdateDownloaded { .. } => "update-downloaded",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            UiEvent::UpdateDownloaded { version } => json!({ "version": version }),
        }
    }
}

/// Platform window operations. `create` must build the window unshown and
/// report `ShellEvent::WindowLoaded` when its content has finished loading,
/// and `ShellEvent::WindowClosed` once the user closed it.
pub trait WindowHost: Send {
    fn create(&mut self, spec: &WindowSpec) -> Result<(), ShellError>;
    fn show(&mut self) -> Result<(), ShellError>;
    fn focus(&mut self) -> Result<(), ShellError>;
    /// Bring a minimized window back
    fn restore(&mut self) -> Result<(), ShellError>;
    fn close(&mut self) -> Result<(), ShellError>;
    fn open_devtools(&mut self) -> Result<(), ShellError>;
    fn set_dock_visible(&mut self, visible: bool) -> Result<(), ShellError>;
    fn emit(&mut self, event: &UiEvent) -> Result<(), ShellError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Absent,
    /// Built but hidden until its content finished loading
    Loading,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A window already existed and was focused instead
    Focused,
    /// Skipped by the one-shot `--hidden` flag
    Suppressed,
}

pub struct WindowManager {
    host: Box<dyn WindowHost>,
    spec: WindowSpec,
    has_dock: bool,
    state: WindowState,
    suppress_once: bool,
}

impl WindowManager {
    pub fn new(host: Box<dyn WindowHost>, spec: WindowSpec, platform: &Platform, hidden: bool) -> Self {
        Self {
            host,
            spec,
            has_dock: platform.has_dock,
            state: WindowState::Absent,
            suppress_once: hidden,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn exists(&self) -> bool {
        self.state != WindowState::Absent
    }

    /// Open the main window, or focus it when it is already open
    pub fn create_window(&mut self) -> Result<CreateOutcome, ShellError> {
        if self.exists() {
            log_failure("focus", self.host.focus());
            return Ok(CreateOutcome::Focused);
        }
        if std::mem::take(&mut self.suppress_once) {
            info!("Launched hidden, not opening the main window");
            return Ok(CreateOutcome::Suppressed);
        }

        self.host.create(&self.spec)?;
        self.state = WindowState::Loading;
        debug!("Main window created, waiting for content");

        if self.has_dock {
            log_failure("show dock icon", self.host.set_dock_visible(true));
        }
        if self.spec.devtools {
            log_failure("open devtools", self.host.open_devtools());
        }
        Ok(CreateOutcome::Created)
    }

    /// Content finished loading: reveal the window
    pub fn on_loaded(&mut self) {
        if self.state != WindowState::Loading {
            debug!("Ignoring load event in state {:?}", self.state);
            return;
        }
        log_failure("show", self.host.show());
        log_failure("focus", self.host.focus());
        self.state = WindowState::Visible;
        info!("Main window shown");
    }

    /// The user closed the window. The process stays resident in the tray.
    pub fn on_closed(&mut self) {
        if self.state == WindowState::Absent {
            return;
        }
        self.state = WindowState::Absent;
        info!("Main window closed");
        if self.has_dock {
            log_failure("hide dock icon", self.host.set_dock_visible(false));
        }
    }

    /// Restore and focus an existing window. Never creates one, and never
    /// reveals a window whose content is still loading.
    pub fn bring_to_front(&mut self) -> bool {
        match self.state {
            WindowState::Absent => {
                debug!("No window to bring to front");
                false
            }
            WindowState::Loading => {
                debug!("Window still loading, it is focused once shown");
                true
            }
            WindowState::Visible => {
                log_failure("restore", self.host.restore());
                log_failure("focus", self.host.focus());
                true
            }
        }
    }

    /// Close the window as part of a shutdown
    pub fn close(&mut self) {
        if !self.exists() {
            return;
        }
        log_failure("close", self.host.close());
        self.state = WindowState::Absent;
    }

    /// Push a notification to the UI. Dropped when no window is open.
    pub fn notify(&mut self, event: UiEvent) -> bool {
        if !self.exists() {
            debug!("No window open, dropping {} notification", event.name());
            return false;
        }
        match self.host.emit(&event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to deliver {}: {}", event.name(), e);
                false
            }
        }
    }
}

fn log_failure(action: &str, result: Result<(), ShellError>) {
    if let Err(e) = result {
        warn!("Window {} failed: {}", action, e);
    }
}
