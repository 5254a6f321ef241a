// Syncrypt Desktop - Configuration
// Shell settings persisted as JSON in the app config directory

use std::path::PathBuf;

use syncrypt_shell::{config, ShellSettings};
use tauri::{AppHandle, Manager};

fn settings_path(app: &AppHandle) -> anyhow::Result<PathBuf> {
    let config_dir = app
        .path()
        .app_config_dir()
        .map_err(|e| anyhow::anyhow!("Failed to get app config dir: {}", e))?;
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("settings.json"))
}

/// Load settings, falling back to defaults when none were saved yet
pub fn load(app: &AppHandle) -> anyhow::Result<ShellSettings> {
    let path = settings_path(app)?;
    Ok(config::load(&path)?)
}

pub fn save(app: &AppHandle, settings: &ShellSettings) -> anyhow::Result<()> {
    let path = settings_path(app)?;
    config::save(&path, settings)?;
    Ok(())
}
