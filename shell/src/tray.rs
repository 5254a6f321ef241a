// Syncrypt Desktop - Tray
// The tray icon is the one control surface that survives closing the window.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::RunMode;
use crate::error::ShellError;
use crate::platform::Platform;

/// Entries of the tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayAction {
    Open,
    RestartDaemon,
    StopDaemon,
    Quit,
}

impl TrayAction {
    pub const MENU: [TrayAction; 4] = [
        TrayAction::Open,
        TrayAction::RestartDaemon,
        TrayAction::StopDaemon,
        TrayAction::Quit,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TrayAction::Open => "open",
            TrayAction::RestartDaemon => "restart_daemon",
            TrayAction::StopDaemon => "stop_daemon",
            TrayAction::Quit => "quit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrayAction::Open => "Open",
            TrayAction::RestartDaemon => "Restart Daemon",
            TrayAction::StopDaemon => "Stop Daemon",
            TrayAction::Quit => "Quit",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::MENU.into_iter().find(|action| action.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraySpec {
    pub icon: PathBuf,
    pub tooltip: &'static str,
    pub items: &'static [TrayAction],
    pub double_click_opens: bool,
}

/// Icons ship in the bundle's resources; a checkout keeps them next to the desktop crate
pub fn resolve_tray_icon(
    mode: RunMode,
    resource_dir: &Path,
    dev_root: &Path,
    platform: &Platform,
) -> PathBuf {
    let root = match mode {
        RunMode::Packaged => resource_dir,
        RunMode::Development => dev_root,
    };
    root.join("icons").join(platform.tray_icon)
}

/// Platform tray. Menu selections come back as `ShellEvent::Tray`, double
/// clicks (when requested) as `ShellEvent::TrayDoubleClick`.
pub trait TrayHost: Send {
    fn install(&mut self, spec: &TraySpec) -> Result<(), ShellError>;
}

pub struct TrayController {
    host: Box<dyn TrayHost>,
    spec: TraySpec,
    installed: bool,
}

impl TrayController {
    pub fn new(host: Box<dyn TrayHost>, icon: PathBuf, platform: &Platform) -> Self {
        Self {
            host,
            spec: TraySpec {
                icon,
                tooltip: "Syncrypt",
                items: &TrayAction::MENU,
                double_click_opens: platform.tray_double_click_opens,
            },
            installed: false,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Create the tray once per process. A missing or unreadable icon is fatal.
    pub fn install(&mut self) -> Result<bool, ShellError> {
        if self.installed {
            return Ok(false);
        }
        if !self.spec.icon.is_file() {
            return Err(ShellError::TrayIcon {
                path: self.spec.icon.clone(),
                reason: "file not found".to_string(),
            });
        }
        self.host.install(&self.spec)?;
        self.installed = true;
        info!("Tray installed with icon {}", self.spec.icon.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::testing::{Call, FakeTray, Recorder};

    #[test]
    fn menu_ids_round_trip() {
        for action in TrayAction::MENU {
            assert_eq!(TrayAction::from_id(action.id()), Some(action));
        }
        assert_eq!(TrayAction::from_id("settings"), None);
    }

    #[test]
    fn icon_location_depends_on_mode() {
        let linux = Platform::for_os(Os::Linux);
        let resources = Path::new("/opt/Syncrypt/resources");
        let checkout = Path::new("/src/syncrypt/desktop/src-tauri");

        assert_eq!(
            resolve_tray_icon(RunMode::Packaged, resources, checkout, &linux),
            PathBuf::from("/opt/Syncrypt/resources/icons/tray.png")
        );
        assert_eq!(
            resolve_tray_icon(
                RunMode::Development,
                resources,
                checkout,
                &Platform::for_os(Os::MacOs)
            ),
            PathBuf::from("/src/syncrypt/desktop/src-tauri/icons/trayTemplate.png")
        );
    }

    #[test]
    fn installs_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("tray.png");
        std::fs::write(&icon, b"png").unwrap();
        let recorder = Recorder::default();
        let mut tray = TrayController::new(
            Box::new(FakeTray::new(recorder.clone())),
            icon,
            &Platform::for_os(Os::Windows),
        );

        assert!(tray.install().unwrap());
        assert!(!tray.install().unwrap());
        assert_eq!(recorder.calls(), vec![Call::TrayInstall { double_click: true }]);
    }

    #[test]
    fn missing_icon_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let mut tray = TrayController::new(
            Box::new(FakeTray::new(recorder.clone())),
            dir.path().join("tray.png"),
            &Platform::for_os(Os::Linux),
        );

        assert!(matches!(tray.install(), Err(ShellError::TrayIcon { .. })));
        assert!(!tray.is_installed());
        assert!(recorder.calls().is_empty());
    }
}
