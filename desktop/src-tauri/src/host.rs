// Syncrypt Desktop - Tauri Host
// Window, tray and process adapters the shell controller drives

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use syncrypt_shell::window::MAIN_WINDOW;
use syncrypt_shell::{
    Activation, Collaborators, InstanceLock, Lifecycle, ShellError, ShellEvent, ShellHandle,
    TokioSpawner, TrayAction, TrayHost, TraySpec, UiEvent, WindowHost, WindowSpec,
};
use tauri::image::Image;
use tauri::menu::{IsMenuItem, Menu, MenuItem};
use tauri::tray::{MouseButton, TrayIcon, TrayIconBuilder, TrayIconEvent};
use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, Wry};
use tracing::debug;

use crate::updater::TauriUpdateFeed;

/// Set once the controller itself asked the process to exit. Any other exit
/// request is held back and routed through the controller first.
#[derive(Debug, Default)]
pub struct ExitGate {
    open: AtomicBool,
}

impl ExitGate {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

pub fn collaborators(app: &AppHandle, events: &ShellHandle, gate: &Arc<ExitGate>) -> Collaborators {
    Collaborators {
        lock: Box::new(PluginLock),
        spawner: Box::new(TokioSpawner::default()),
        window: Box::new(TauriWindow {
            app: app.clone(),
            events: events.clone(),
        }),
        tray: Box::new(TauriTray {
            app: app.clone(),
            events: events.clone(),
            icon: None,
        }),
        updates: Box::new(TauriUpdateFeed::new(app.clone(), events.clone(), gate.clone())),
        lifecycle: Box::new(TauriLifecycle {
            app: app.clone(),
            gate: gate.clone(),
        }),
    }
}

/// Lock held by the single-instance plugin. A later launch is handed to
/// `forward_activation` and exits inside the plugin, before `setup` runs, so
/// reaching the controller means this process owns the lock.
pub struct PluginLock;

#[async_trait]
impl InstanceLock for PluginLock {
    async fn acquire(&mut self, _activation: &Activation) -> io::Result<bool> {
        Ok(true)
    }
}

/// Single-instance plugin callback: runs in the primary for every later launch
pub fn forward_activation(shell: &ShellHandle, argv: Vec<String>, cwd: String) {
    shell.send(ShellEvent::SecondInstance(Activation::forwarded(argv, cwd)));
}

pub struct TauriWindow {
    app: AppHandle,
    events: ShellHandle,
}

impl TauriWindow {
    fn window(&self) -> Result<WebviewWindow, ShellError> {
        self.app
            .get_webview_window(MAIN_WINDOW)
            .ok_or_else(|| ShellError::Window("main window is gone".to_string()))
    }
}

fn window_error(e: tauri::Error) -> ShellError {
    ShellError::Window(e.to_string())
}

impl WindowHost for TauriWindow {
    fn create(&mut self, spec: &WindowSpec) -> Result<(), ShellError> {
        let events = self.events.clone();
        WebviewWindowBuilder::new(&self.app, spec.label, WebviewUrl::App(spec.entry.into()))
            .title(spec.title)
            .inner_size(spec.size.0, spec.size.1)
            .min_inner_size(spec.min_size.0, spec.min_size.1)
            .visible(false)
            .on_page_load(move |_window, payload| {
                if matches!(payload.event(), PageLoadEvent::Finished) {
                    events.send(ShellEvent::WindowLoaded);
                }
            })
            .build()
            .map_err(window_error)?;
        Ok(())
    }

    fn show(&mut self) -> Result<(), ShellError> {
        self.window()?.show().map_err(window_error)
    }

    fn focus(&mut self) -> Result<(), ShellError> {
        self.window()?.set_focus().map_err(window_error)
    }

    fn restore(&mut self) -> Result<(), ShellError> {
        let window = self.window()?;
        if window.is_minimized().map_err(window_error)? {
            window.unminimize().map_err(window_error)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ShellError> {
        self.window()?.destroy().map_err(window_error)
    }

    fn open_devtools(&mut self) -> Result<(), ShellError> {
        self.window()?.open_devtools();
        Ok(())
    }

    fn set_dock_visible(&mut self, visible: bool) -> Result<(), ShellError> {
        #[cfg(target_os = "macos")]
        self.app.set_dock_visibility(visible).map_err(window_error)?;
        #[cfg(not(target_os = "macos"))]
        let _ = visible;
        Ok(())
    }

    fn emit(&mut self, event: &UiEvent) -> Result<(), ShellError> {
        self.app
            .emit_to(MAIN_WINDOW, event.name(), event.payload())
            .map_err(window_error)
    }
}

pub struct TauriTray {
    app: AppHandle,
    events: ShellHandle,
    /// Dropping the handle removes the icon
    icon: Option<TrayIcon>,
}

fn tray_error(e: tauri::Error) -> ShellError {
    ShellError::Tray(e.to_string())
}

impl TrayHost for TauriTray {
    fn install(&mut self, spec: &TraySpec) -> Result<(), ShellError> {
        let icon = Image::from_path(&spec.icon).map_err(|e| ShellError::TrayIcon {
            path: spec.icon.clone(),
            reason: e.to_string(),
        })?;

        let items = spec
            .items
            .iter()
            .map(|action| MenuItem::with_id(&self.app, action.id(), action.label(), true, None::<&str>))
            .collect::<Result<Vec<_>, _>>()
            .map_err(tray_error)?;
        let entries: Vec<&dyn IsMenuItem<Wry>> =
            items.iter().map(|item| item as &dyn IsMenuItem<Wry>).collect();
        let menu = Menu::with_items(&self.app, &entries).map_err(tray_error)?;

        let menu_events = self.events.clone();
        let click_events = self.events.clone();
        let double_click_opens = spec.double_click_opens;

        let builder = TrayIconBuilder::with_id("main")
            .icon(icon)
            .tooltip(spec.tooltip)
            .menu(&menu)
            .on_menu_event(move |_app, event| match TrayAction::from_id(event.id.as_ref()) {
                Some(action) => menu_events.send(ShellEvent::Tray(action)),
                None => debug!("Unknown tray menu item {:?}", event.id),
            })
            .on_tray_icon_event(move |_tray, event| {
                if double_click_opens
                    && matches!(
                        event,
                        TrayIconEvent::DoubleClick {
                            button: MouseButton::Left,
                            ..
                        }
                    )
                {
                    click_events.send(ShellEvent::TrayDoubleClick);
                }
            });

        #[cfg(target_os = "macos")]
        let builder = builder.icon_as_template(true);

        self.icon = Some(builder.build(&self.app).map_err(tray_error)?);
        Ok(())
    }
}

pub struct TauriLifecycle {
    app: AppHandle,
    gate: Arc<ExitGate>,
}

impl Lifecycle for TauriLifecycle {
    fn exit(&mut self, code: i32) {
        self.gate.open();
        self.app.exit(code);
    }

    fn abort(&mut self) {
        // Nothing was started yet, so there is nothing to tear down
        std::process::exit(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncrypt_shell::shell_channel;

    #[test]
    fn later_launch_reaches_controller_as_second_instance() {
        let (shell, mut inbox) = shell_channel();

        forward_activation(&shell, vec!["syncrypt-desktop".into()], "/home/alice".into());

        match inbox.try_recv() {
            Ok(ShellEvent::SecondInstance(activation)) => {
                assert_eq!(activation.args, ["syncrypt-desktop"]);
                assert_eq!(activation.cwd, Some("/home/alice".into()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn plugin_lock_is_held_once_running() {
        let mut lock = PluginLock;
        let acquired = tauri::async_runtime::block_on(lock.acquire(&Activation::default()));
        assert!(acquired.unwrap());
    }
}
