// Syncrypt Desktop - UI Bootstrap
// Everything the UI layer needs to talk to the daemon, handed over in one call

use serde::Serialize;

use crate::config::ShellSettings;
use crate::daemon::read_auth_token;
use crate::error::ShellError;

const DEFAULT_LOCALE: &str = "en_US.UTF-8";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiBootstrap {
    pub api_auth_token: String,
    pub api_url: String,
    pub path_separator: String,
    /// How often the UI polls the daemon
    pub update_interval: u64,
    pub version: String,
    pub locale: String,
}

impl UiBootstrap {
    pub fn collect(settings: &ShellSettings, version: &str) -> Result<Self, ShellError> {
        let token = read_auth_token(&settings.daemon.config_path())?;
        Ok(Self {
            api_auth_token: token,
            api_url: settings.daemon.api_url.clone(),
            path_separator: std::path::MAIN_SEPARATOR.to_string(),
            update_interval: settings.ui.refresh_interval_ms,
            version: version.to_string(),
            locale: env_locale(|key| std::env::var(key).ok()),
        })
    }
}

/// First non-empty of the usual locale variables
pub fn env_locale(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"]
        .into_iter()
        .find_map(|key| lookup(key).filter(|value| !value.is_empty()))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn locale_precedence() {
        let vars: HashMap<&str, &str> = [("LANG", "de_DE.UTF-8"), ("LC_MESSAGES", "fr_FR.UTF-8")]
            .into_iter()
            .collect();
        let locale = env_locale(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(locale, "fr_FR.UTF-8");
    }

    #[test]
    fn locale_defaults_when_unset_or_empty() {
        assert_eq!(env_locale(|_| None), "en_US.UTF-8");
        assert_eq!(env_locale(|_| Some(String::new())), "en_US.UTF-8");
    }

    #[test]
    fn collect_reads_token_from_daemon_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config");
        std::fs::write(&config, "[api]\nauth_token = deadbeef42\n").unwrap();

        let mut settings = ShellSettings::default();
        settings.daemon.config_path = Some(config);

        let bootstrap = UiBootstrap::collect(&settings, "0.4.0").unwrap();
        assert_eq!(bootstrap.api_auth_token, "deadbeef42");
        assert_eq!(bootstrap.api_url, "http://127.0.0.1:28080/v1/");
        assert_eq!(bootstrap.update_interval, 3000);
        assert_eq!(bootstrap.version, "0.4.0");
    }

    #[test]
    fn collect_fails_without_daemon_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ShellSettings::default();
        settings.daemon.config_path = Some(dir.path().join("missing"));
        assert!(UiBootstrap::collect(&settings, "0.4.0").is_err());
    }
}
