// Syncrypt Desktop - Single Instance Guard
// The lock is claimed before anything else starts; later launches hand their
// arguments to the running instance and exit.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

/// What a launch asked for, forwarded to the running instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Activation {
    pub fn current() -> Self {
        Self {
            args: std::env::args().collect(),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Activation as reported by a later launch. An empty `cwd` means unknown.
    pub fn forwarded(args: Vec<String>, cwd: String) -> Self {
        Self {
            args,
            cwd: (!cwd.is_empty()).then(|| PathBuf::from(cwd)),
        }
    }
}

/// Application-wide mutual exclusion
#[async_trait]
pub trait InstanceLock: Send {
    /// Claim the lock. Returns `false` once `activation` has been delivered to
    /// the instance that already holds it.
    async fn acquire(&mut self, activation: &Activation) -> io::Result<bool>;
}
