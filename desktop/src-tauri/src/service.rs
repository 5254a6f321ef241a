// Syncrypt Desktop - Daemon Service
// Resolves where the daemon and tray icon live for this launch, and exposes
// daemon control to the UI

use std::path::Path;

use syncrypt_shell::daemon::{probe_api, resolve_daemon_path, ApiProbe};
use syncrypt_shell::tray::resolve_tray_icon;
use syncrypt_shell::{
    Activation, LaunchOptions, Platform, RunMode, ShellContext, ShellEvent, ShellHandle,
    ShellSettings, ShellStatus, TrayAction,
};
use tauri::{AppHandle, Manager, State};
use tracing::info;

/// Checkout directory of this crate; holds the icons in development
const DEV_ROOT: &str = env!("CARGO_MANIFEST_DIR");

pub fn shell_context(
    app: &AppHandle,
    settings: ShellSettings,
    launch: LaunchOptions,
) -> anyhow::Result<ShellContext> {
    let platform = Platform::current();
    let mode = RunMode::from_env();
    let resource_dir = app
        .path()
        .resource_dir()
        .map_err(|e| anyhow::anyhow!("Failed to get resource dir: {}", e))?;

    let daemon_path = resolve_daemon_path(mode, &resource_dir, &settings.daemon, &platform);
    let tray_icon = resolve_tray_icon(mode, &resource_dir, Path::new(DEV_ROOT), &platform);
    info!(
        ?mode,
        "Resource dir: {}, daemon: {}",
        resource_dir.display(),
        daemon_path.display()
    );

    Ok(ShellContext {
        platform,
        mode,
        launch,
        settings,
        activation: Activation::current(),
        daemon_path,
        tray_icon,
    })
}

/// Tauri command to get daemon, window, update and tray state
#[tauri::command]
pub async fn get_shell_status(shell: State<'_, ShellHandle>) -> Result<ShellStatus, String> {
    shell
        .status()
        .await
        .ok_or_else(|| "Shell is shutting down".to_string())
}

/// Tauri command to restart the daemon
#[tauri::command]
pub async fn restart_daemon(shell: State<'_, ShellHandle>) -> Result<(), String> {
    shell.send(ShellEvent::Tray(TrayAction::RestartDaemon));
    Ok(())
}

/// Tauri command to stop the daemon
#[tauri::command]
pub async fn stop_daemon(shell: State<'_, ShellHandle>) -> Result<(), String> {
    shell.send(ShellEvent::Tray(TrayAction::StopDaemon));
    Ok(())
}

/// Tauri command to check whether the daemon's API answers
#[tauri::command]
pub async fn check_daemon_api(settings: State<'_, ShellSettings>) -> Result<ApiProbe, String> {
    Ok(probe_api(&settings.daemon.api_url).await)
}
