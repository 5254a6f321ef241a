// Syncrypt Desktop - Update Coordination
// Checks the update feed after a settle delay, tells the UI once a download
// is ready and hands over to the installer on request.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::{ShellEvent, ShellHandle};
use crate::window::UiEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateState {
    Idle,
    Checking,
    /// Downloading in the background
    Available { version: String },
    Downloaded { version: String },
    /// Terminal: the running binary is being replaced
    Installing { version: String },
}

impl UpdateState {
    fn name(&self) -> &'static str {
        match self {
            UpdateState::Idle => "idle",
            UpdateState::Checking => "checking",
            UpdateState::Available { .. } => "available",
            UpdateState::Downloaded { .. } => "downloaded",
            UpdateState::Installing { .. } => "installing",
        }
    }
}

/// Reported by the update feed through `ShellEvent::Update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    UpToDate,
    Available { version: String },
    Downloaded { version: String },
    Failed(String),
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Cannot {action} while update is {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    #[error("Update install failed: {0}")]
    Install(String),
}

/// External update mechanism
pub trait UpdateFeed: Send {
    /// Start a background check. A found update downloads without asking;
    /// progress arrives as `ShellEvent::Update`.
    fn check(&mut self);

    /// Replace the running binary and relaunch. Only returns on failure.
    fn quit_and_install(&mut self) -> Result<(), UpdateError>;
}

pub struct UpdateCoordinator {
    feed: Box<dyn UpdateFeed>,
    state: UpdateState,
    delay: Duration,
    timer: Option<JoinHandle<()>>,
}

impl UpdateCoordinator {
    pub fn new(feed: Box<dyn UpdateFeed>, delay: Duration) -> Self {
        Self {
            feed,
            state: UpdateState::Idle,
            delay,
            timer: None,
        }
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    /// Arm the one startup check
    pub fn schedule(&mut self, events: &ShellHandle) {
        if self.timer.is_some() {
            return;
        }
        let events = events.clone();
        let delay = self.delay;
        info!("Checking for updates in {:?}", delay);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.send(ShellEvent::UpdateCheckDue);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn check_now(&mut self) {
        if self.state != UpdateState::Idle {
            debug!("Update check skipped, update is {}", self.state.name());
            return;
        }
        info!("Checking for updates...");
        self.state = UpdateState::Checking;
        self.feed.check();
    }

    /// Apply a feed event. Returns the notification to forward to the UI, if any.
    pub fn on_event(&mut self, event: UpdateEvent) -> Option<UiEvent> {
        if matches!(self.state, UpdateState::Installing { .. }) {
            debug!("Ignoring {:?} while installing", event);
            return None;
        }
        match event {
            UpdateEvent::UpToDate => {
                info!("No update available");
                self.state = UpdateState::Idle;
                None
            }
            UpdateEvent::Available { version } => {
                info!("Update {} available, downloading in background", version);
                self.state = UpdateState::Available { version };
                None
            }
            UpdateEvent::Downloaded { version } => {
                info!("Update {} downloaded", version);
                self.state = UpdateState::Downloaded {
                    version: version.clone(),
                };
                Some(UiEvent::UpdateDownloaded { version })
            }
            UpdateEvent::Failed(reason) => {
                warn!("Update check failed: {}", reason);
                self.state = UpdateState::Idle;
                None
            }
        }
    }

    /// Enter the irreversible installing state. Only valid once a download is ready.
    pub fn begin_install(&mut self) -> Result<String, UpdateError> {
        match &self.state {
            UpdateState::Downloaded { version } => {
                let version = version.clone();
                self.state = UpdateState::Installing {
                    version: version.clone(),
                };
                Ok(version)
            }
            other => Err(UpdateError::InvalidTransition {
                action: "install",
                state: other.name(),
            }),
        }
    }

    pub fn install(&mut self) -> Result<(), UpdateError> {
        self.feed.quit_and_install()
    }
}

impl Drop for UpdateCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::shell_channel;
    use crate::testing::{Call, FakeFeed, Recorder};

    fn coordinator(recorder: &Recorder) -> UpdateCoordinator {
        UpdateCoordinator::new(
            Box::new(FakeFeed::new(recorder.clone())),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn downloaded_is_forwarded_to_ui() {
        let recorder = Recorder::default();
        let mut updates = coordinator(&recorder);

        updates.check_now();
        assert_eq!(updates.state(), &UpdateState::Checking);
        assert_eq!(
            updates.on_event(UpdateEvent::Available {
                version: "0.5.0".into()
            }),
            None
        );
        assert_eq!(
            updates.on_event(UpdateEvent::Downloaded {
                version: "0.5.0".into()
            }),
            Some(UiEvent::UpdateDownloaded {
                version: "0.5.0".into()
            })
        );
        assert_eq!(recorder.calls(), vec![Call::UpdateCheck]);
    }

    #[test]
    fn install_requires_download() {
        let recorder = Recorder::default();
        let mut updates = coordinator(&recorder);

        assert!(matches!(
            updates.begin_install(),
            Err(UpdateError::InvalidTransition { state: "idle", .. })
        ));

        updates.on_event(UpdateEvent::Downloaded {
            version: "0.5.0".into(),
        });
        assert_eq!(updates.begin_install().unwrap(), "0.5.0");
        assert!(updates.begin_install().is_err());
    }

    #[test]
    fn installing_absorbs_later_events() {
        let recorder = Recorder::default();
        let mut updates = coordinator(&recorder);
        updates.on_event(UpdateEvent::Downloaded {
            version: "0.5.0".into(),
        });
        updates.begin_install().unwrap();

        assert_eq!(updates.on_event(UpdateEvent::Failed("offline".into())), None);
        assert_eq!(
            updates.state(),
            &UpdateState::Installing {
                version: "0.5.0".into()
            }
        );
    }

    #[test]
    fn failure_returns_to_idle_and_allows_recheck() {
        let recorder = Recorder::default();
        let mut updates = coordinator(&recorder);

        updates.check_now();
        updates.check_now();
        updates.on_event(UpdateEvent::Failed("timeout".into()));
        updates.check_now();

        assert_eq!(
            recorder.count(|c| *c == Call::UpdateCheck),
            2,
            "a check in flight is not duplicated"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn check_fires_after_settle_delay() {
        let recorder = Recorder::default();
        let mut updates = coordinator(&recorder);
        let (handle, mut events) = shell_channel();

        updates.schedule(&handle);
        updates.schedule(&handle);

        let started = tokio::time::Instant::now();
        assert!(matches!(events.recv().await, Some(ShellEvent::UpdateCheckDue)));
        assert!(started.elapsed() >= Duration::from_secs(3));

        let second = tokio::time::timeout(Duration::from_secs(60), events.recv()).await;
        assert!(second.is_err(), "only one check is scheduled");
    }
}
