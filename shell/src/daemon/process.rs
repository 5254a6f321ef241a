// Syncrypt Desktop - Daemon Process
// Spawns the daemon binary and reaps it from a monitor task

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::events::{ShellEvent, ShellHandle};

/// Identifies one spawn of the daemon; never reused within a process lifetime
pub type DaemonId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonExit {
    pub id: DaemonId,
    /// `None` when the process was ended by a signal
    pub code: Option<i32>,
}

/// Starts daemon processes. Exits must be reported as `ShellEvent::DaemonExited`.
pub trait DaemonSpawner: Send {
    fn spawn(
        &mut self,
        path: &Path,
        id: DaemonId,
        events: &ShellHandle,
    ) -> io::Result<Box<dyn DaemonProcess>>;
}

/// A live daemon process owned by the supervisor
#[async_trait]
pub trait DaemonProcess: Send {
    fn pid(&self) -> Option<u32>;

    /// Ask the process to terminate and wait until it has been reaped
    async fn terminate(&mut self) -> io::Result<Option<i32>>;
}

/// How long a stopping daemon may take to exit before it is killed
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Spawns the daemon with tokio and logs its output
#[derive(Debug, Clone, Copy)]
pub struct TokioSpawner {
    grace: Duration,
}

impl TokioSpawner {
    pub fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for TokioSpawner {
    fn default() -> Self {
        Self::with_grace(STOP_GRACE)
    }
}

impl DaemonSpawner for TokioSpawner {
    fn spawn(
        &mut self,
        path: &Path,
        id: DaemonId,
        events: &ShellHandle,
    ) -> io::Result<Box<dyn DaemonProcess>> {
        let mut child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, id, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, id, true));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (reaped_tx, reaped_rx) = oneshot::channel();
        tokio::spawn(monitor(child, id, self.grace, stop_rx, reaped_tx, events.clone()));

        Ok(Box::new(TokioDaemon {
            pid,
            stop: Some(stop_tx),
            reaped: Some(reaped_rx),
        }))
    }
}

struct TokioDaemon {
    pid: Option<u32>,
    stop: Option<oneshot::Sender<()>>,
    reaped: Option<oneshot::Receiver<Option<i32>>>,
}

#[async_trait]
impl DaemonProcess for TokioDaemon {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn terminate(&mut self) -> io::Result<Option<i32>> {
        if let Some(stop) = self.stop.take() {
            // The monitor may already have reaped an exited child
            let _ = stop.send(());
        }
        match self.reaped.take() {
            Some(reaped) => reaped
                .await
                .map_err(|_| io::Error::other("daemon monitor ended without reporting an exit")),
            None => Ok(None),
        }
    }
}

/// Owns the child until it exits. A stop request asks the daemon to shut
/// down and kills it once `grace` has passed.
async fn monitor(
    mut child: Child,
    id: DaemonId,
    grace: Duration,
    stop: oneshot::Receiver<()>,
    reaped: oneshot::Sender<Option<i32>>,
    events: ShellHandle,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = stop => None,
    };

    let status = match exited {
        Some(status) => status,
        None => {
            request_shutdown(&mut child, id);
            match timeout(grace, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(daemon = id, "Daemon ignored shutdown for {:?}, killing", grace);
                    kill(&mut child, id);
                    child.wait().await
                }
            }
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(daemon = id, "Failed to reap daemon: {}", e);
            None
        }
    };

    let _ = reaped.send(code);
    events.send(ShellEvent::DaemonExited(DaemonExit { id, code }));
}

#[cfg(unix)]
fn request_shutdown(child: &mut Child, id: DaemonId) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    debug!(daemon = id, pid, "Sending SIGTERM to daemon");
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        debug!(daemon = id, "SIGTERM failed: {}", e);
        kill(child, id);
    }
}

#[cfg(not(unix))]
fn request_shutdown(child: &mut Child, id: DaemonId) {
    kill(child, id);
}

fn kill(child: &mut Child, id: DaemonId) {
    debug!(daemon = id, "Sending kill to daemon");
    if let Err(e) = child.start_kill() {
        debug!(daemon = id, "Kill failed, daemon already gone: {}", e);
    }
}

async fn forward_output<R>(stream: R, id: DaemonId, stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if stderr => warn!(target: "daemon", daemon = id, "{}", line),
            Ok(Some(line)) => info!(target: "daemon", daemon = id, "{}", line),
            Ok(None) => break,
            Err(e) => {
                debug!(daemon = id, "Daemon output closed: {}", e);
                break;
            }
        }
    }
}
