// Syncrypt Desktop - Updater
// Background check and download through the updater plugin; installs on request

use std::sync::{Arc, Mutex, PoisonError};

use syncrypt_shell::update::UpdateError;
use syncrypt_shell::{ShellEvent, ShellHandle, UpdateEvent, UpdateFeed};
use tauri::AppHandle;
use tauri_plugin_updater::{Update, UpdaterExt};
use tracing::info;

use crate::host::ExitGate;

struct Downloaded {
    update: Update,
    bytes: Vec<u8>,
}

pub struct TauriUpdateFeed {
    app: AppHandle,
    events: ShellHandle,
    gate: Arc<ExitGate>,
    pending: Arc<Mutex<Option<Downloaded>>>,
}

impl TauriUpdateFeed {
    pub fn new(app: AppHandle, events: ShellHandle, gate: Arc<ExitGate>) -> Self {
        Self {
            app,
            events,
            gate,
            pending: Arc::new(Mutex::new(None)),
        }
    }
}

/// Check, then download silently. `Available` is reported before the download starts.
async fn fetch(app: &AppHandle, events: &ShellHandle) -> tauri_plugin_updater::Result<Option<Downloaded>> {
    let Some(update) = app.updater()?.check().await? else {
        return Ok(None);
    };
    events.send(ShellEvent::Update(UpdateEvent::Available {
        version: update.version.clone(),
    }));

    let bytes = update.download(|_, _| {}, || {}).await?;
    Ok(Some(Downloaded { update, bytes }))
}

impl UpdateFeed for TauriUpdateFeed {
    fn check(&mut self) {
        let app = self.app.clone();
        let events = self.events.clone();
        let pending = self.pending.clone();

        tauri::async_runtime::spawn(async move {
            let event = match fetch(&app, &events).await {
                Ok(Some(downloaded)) => {
                    let version = downloaded.update.version.clone();
                    *pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(downloaded);
                    UpdateEvent::Downloaded { version }
                }
                Ok(None) => UpdateEvent::UpToDate,
                Err(e) => UpdateEvent::Failed(e.to_string()),
            };
            events.send(ShellEvent::Update(event));
        });
    }

    fn quit_and_install(&mut self) -> Result<(), UpdateError> {
        let downloaded = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| UpdateError::Install("no downloaded update".to_string()))?;

        downloaded
            .update
            .install(&downloaded.bytes)
            .map_err(|e| UpdateError::Install(e.to_string()))?;

        info!("Update {} installed, restarting...", downloaded.update.version);
        self.gate.open();
        self.app.restart()
    }
}
