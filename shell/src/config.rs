// Syncrypt Desktop - Configuration Management
// Shell settings stored as JSON next to the app's other config files

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

/// Whether the shell runs from an installed bundle or a source checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Packaged,
    Development,
}

impl RunMode {
    /// `SYNCRYPT_ENV=development` (or the older `NODE_ENV`) selects development mode
    pub fn from_env() -> Self {
        Self::from_vars(env::var("SYNCRYPT_ENV").ok(), env::var("NODE_ENV").ok())
    }

    fn from_vars(syncrypt_env: Option<String>, node_env: Option<String>) -> Self {
        let development = [syncrypt_env, node_env]
            .into_iter()
            .flatten()
            .any(|value| value.eq_ignore_ascii_case("development"));
        if development {
            RunMode::Development
        } else {
            RunMode::Packaged
        }
    }

    pub fn is_development(self) -> bool {
        self == RunMode::Development
    }
}

/// Application settings (non-sensitive, stored in app config dir)
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ShellSettings {
    pub daemon: DaemonSettings,
    pub updates: UpdateSettings,
    pub ui: UiSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonSettings {
    /// Directory below `<installRoot>/app` holding the bundled daemon
    pub build_subdir: String,
    pub executable: String,
    /// Daemon location when running from a source checkout
    pub dev_path: PathBuf,
    /// Local HTTP API the UI layer talks to
    pub api_url: String,
    /// Overrides `~/.config/syncrypt/config`
    pub config_path: Option<PathBuf>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            build_subdir: "syncrypt".to_string(),
            executable: "syncrypt_daemon".to_string(),
            dev_path: PathBuf::from("client/syncrypt_daemon"),
            api_url: "http://127.0.0.1:28080/v1/".to_string(),
            config_path: None,
        }
    }
}

impl DaemonSettings {
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(default_daemon_config_path)
    }
}

/// Path of the config file the daemon writes its API token to
pub fn default_daemon_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("syncrypt")
        .join("config")
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateSettings {
    pub check_delay_secs: u64,
    /// Whether a `--hidden` launch still checks for updates
    pub check_when_hidden: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            check_delay_secs: 3,
            check_when_hidden: true,
        }
    }
}

impl UpdateSettings {
    pub fn check_delay(&self) -> Duration {
        Duration::from_secs(self.check_delay_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub refresh_interval_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 3000,
        }
    }
}

/// Load settings from file, falling back to defaults when it does not exist
pub fn load(path: &Path) -> Result<ShellSettings, ShellError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: ShellSettings = serde_json::from_str(&content)?;
        Ok(settings)
    } else {
        Ok(ShellSettings::default())
    }
}

/// Save settings to file
pub fn save(path: &Path, settings: &ShellSettings) -> Result<(), ShellError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
