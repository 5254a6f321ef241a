// Syncrypt Desktop - Shell Events
// Every callback source funnels into the controller through one channel.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::controller::ShellStatus;
use crate::daemon::DaemonExit;
use crate::instance::Activation;
use crate::tray::TrayAction;
use crate::update::UpdateEvent;

/// Typed input of the controller's state-transition function
#[derive(Debug)]
pub enum ShellEvent {
    /// Platform finished initialising; runs the startup sequence
    Ready,
    /// Dock icon click or equivalent
    Activate,
    /// Another launch forwarded its activation to us
    SecondInstance(Activation),
    AllWindowsClosed,
    WindowLoaded,
    WindowClosed,
    Tray(TrayAction),
    TrayDoubleClick,
    DaemonExited(DaemonExit),
    /// Settle delay after startup elapsed
    UpdateCheckDue,
    Update(UpdateEvent),
    /// User confirmed installing the downloaded update
    InstallRequested,
    Quit,
    Status(oneshot::Sender<ShellStatus>),
}

pub type ShellEvents = mpsc::UnboundedReceiver<ShellEvent>;

/// Cloneable sender side of the controller's inbox
#[derive(Clone, Debug)]
pub struct ShellHandle {
    tx: mpsc::UnboundedSender<ShellEvent>,
}

/// Create the controller inbox and the handle every event source shares
pub fn shell_channel() -> (ShellHandle, ShellEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ShellHandle { tx }, rx)
}

impl ShellHandle {
    pub fn send(&self, event: ShellEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            debug!("Shell controller is gone, dropping {:?}", event);
        }
    }

    /// Ask the controller for a snapshot of its state
    pub async fn status(&self) -> Option<ShellStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(ShellEvent::Status(reply));
        rx.await.ok()
    }
}
