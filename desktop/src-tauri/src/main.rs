// Syncrypt Desktop - Tauri v2
// Main entry point

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod host;
mod service;
mod updater;

use std::sync::Arc;

use host::ExitGate;
use syncrypt_shell::window::MAIN_WINDOW;
use syncrypt_shell::{
    shell_channel, LaunchOptions, ShellController, ShellEvent, ShellHandle, ShellSettings,
    UiBootstrap,
};
use tauri::{AppHandle, Manager, RunEvent, State};
use tauri_plugin_autostart::MacosLauncher;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Tauri command to install the downloaded update and relaunch
#[tauri::command]
async fn quit_and_install(shell: State<'_, ShellHandle>) -> Result<(), String> {
    shell.send(ShellEvent::InstallRequested);
    Ok(())
}

/// Tauri command to get everything the UI needs at startup
#[tauri::command]
async fn get_ui_bootstrap(
    app: AppHandle,
    settings: State<'_, ShellSettings>,
) -> Result<UiBootstrap, String> {
    let version = app.package_info().version.to_string();
    UiBootstrap::collect(&settings, &version).map_err(|e| e.to_string())
}

/// Tauri command to get app settings
#[tauri::command]
async fn get_settings(app: AppHandle) -> Result<ShellSettings, String> {
    config::load(&app).map_err(|e| e.to_string())
}

/// Tauri command to save app settings. They apply on next launch.
#[tauri::command]
async fn save_settings(app: AppHandle, new_settings: ShellSettings) -> Result<(), String> {
    config::save(&app, &new_settings).map_err(|e| e.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    init_tracing();

    let launch = LaunchOptions::from_env();
    let (shell, inbox) = shell_channel();
    let gate = Arc::new(ExitGate::default());

    let instance_shell = shell.clone();
    let setup_shell = shell.clone();
    let setup_gate = gate.clone();
    let window_shell = shell.clone();

    let app = tauri::Builder::default()
        // First, so a second launch exits before anything else initializes
        .plugin(tauri_plugin_single_instance::init(move |_app, argv, cwd| {
            host::forward_activation(&instance_shell, argv, cwd);
        }))
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            Some(vec!["--hidden"]),
        ))
        .manage(shell.clone())
        .setup(move |app| {
            let handle = app.handle().clone();

            let settings = config::load(&handle).unwrap_or_else(|e| {
                warn!("Failed to load settings, using defaults: {}", e);
                ShellSettings::default()
            });
            let context = service::shell_context(&handle, settings.clone(), launch)?;
            app.manage(settings);

            let parts = host::collaborators(&handle, &setup_shell, &setup_gate);
            let controller = ShellController::new(context, parts, setup_shell.clone());
            tauri::async_runtime::spawn(controller.run(inbox));

            setup_shell.send(ShellEvent::Ready);
            Ok(())
        })
        .on_window_event(move |window, event| {
            if window.label() == MAIN_WINDOW {
                if let tauri::WindowEvent::Destroyed = event {
                    window_shell.send(ShellEvent::WindowClosed);
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            service::get_shell_status,
            service::restart_daemon,
            service::stop_daemon,
            service::check_daemon_api,
            quit_and_install,
            get_ui_bootstrap,
            get_settings,
            save_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(move |_app, event| match event {
        RunEvent::ExitRequested { code, api, .. } => {
            if gate.is_open() {
                return;
            }
            api.prevent_exit();
            match code {
                // Last window closed; stay in the tray
                None => shell.send(ShellEvent::AllWindowsClosed),
                Some(code) => {
                    info!("Exit requested with code {}, shutting down...", code);
                    shell.send(ShellEvent::Quit);
                }
            }
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => shell.send(ShellEvent::Activate),
        _ => {}
    });
}
