// Syncrypt Desktop - Platform Capabilities
// Queried once at startup so components never branch on the OS themselves.

use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: Os,
    /// Appended to executables that lack it
    pub exe_suffix: &'static str,
    pub window_size: (f64, f64),
    pub min_window_size: (f64, f64),
    /// Closing the window hides the dock icon
    pub has_dock: bool,
    /// Single click does not surface the tray menu, so double click opens the window
    pub tray_double_click_opens: bool,
    pub tray_icon: &'static str,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::for_os(Os::Windows)
        } else if cfg!(target_os = "macos") {
            Self::for_os(Os::MacOs)
        } else {
            Self::for_os(Os::Linux)
        }
    }

    pub fn for_os(os: Os) -> Self {
        match os {
            Os::Windows => Self {
                os,
                exe_suffix: ".exe",
                // Window chrome eats into the client area on Windows
                window_size: (1040.0, 800.0),
                min_window_size: (900.0, 750.0),
                has_dock: false,
                tray_double_click_opens: true,
                tray_icon: "tray.png",
            },
            Os::MacOs => Self {
                os,
                exe_suffix: "",
                window_size: (1024.0, 768.0),
                min_window_size: (900.0, 750.0),
                has_dock: true,
                tray_double_click_opens: false,
                tray_icon: "trayTemplate.png",
            },
            Os::Linux => Self {
                os,
                exe_suffix: "",
                window_size: (1024.0, 768.0),
                min_window_size: (900.0, 750.0),
                has_dock: false,
                tray_double_click_opens: false,
                tray_icon: "tray.png",
            },
        }
    }

    /// Append the executable suffix unless the path already carries it
    pub fn with_exe_suffix(&self, path: PathBuf) -> PathBuf {
        if self.exe_suffix.is_empty() {
            return path;
        }
        let extension = self.exe_suffix.trim_start_matches('.');
        let has_suffix = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if has_suffix {
            return path;
        }
        let mut raw: OsString = path.into_os_string();
        raw.push(self.exe_suffix);
        PathBuf::from(raw)
    }
}
