//! Keeps the machine awake while a long archiver run is in progress.
//!
//! The helper is a platform tool started as a child process and killed
//! afterwards. Its handle is shared with the interrupt handler so Ctrl-C can
//! stop it before the process exits. Failing to start or stop it is never
//! fatal.

use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

/// Command that inhibits sleep on this platform, if one is known.
pub fn helper_command() -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("caffeinate");
        command.args(["-d", "-i", "-s"]);
        Some(command)
    } else if cfg!(target_os = "linux") {
        let mut command = Command::new("systemd-inhibit");
        command.args(["--what=idle:sleep", "--who=packrat", "--why=Archive operation in progress", "--mode=block", "sleep", "infinity"]);
        Some(command)
    } else {
        None
    }
}

/// Shared handle to the running helper, if any.
#[derive(Debug, Clone, Default)]
pub struct KeepAwake {
    child: Arc<Mutex<Option<Child>>>,
}

impl KeepAwake {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Starts the platform helper.
    pub fn start(&self) -> io::Result<()> {
        let command = helper_command().ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "no sleep prevention tool for this platform"))?;
        self.start_with(command)
    }

    /// Starts `command` as the helper; a helper that is already running is kept.
    pub fn start_with(&self, mut command: Command) -> io::Result<()> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Ok(());
        }

        let child = command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
        debug!(pid = child.id(), "sleep prevention started");
        *slot = Some(child);
        Ok(())
    }

    /// Stops and reaps the helper. Returns whether one was running.
    pub fn stop(&self) -> bool {
        let Some(mut child) = self.slot().take() else {
            return false;
        };

        if let Err(e) = child.kill() {
            warn!(error = %e, "could not stop sleep prevention");
        }
        if let Err(e) = child.wait() {
            warn!(error = %e, "could not reap sleep prevention process");
        }

        debug!("sleep prevention stopped");
        true
    }
}
