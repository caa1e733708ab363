//! Launcher liveness and one-shot start.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{info, warn};

use crate::directory::ProcessDirectory;
use crate::errors::TuneError;
use crate::types::StartOutcome;

/// True if `path` names an existing file whose base name equals `expected`
/// case-insensitively.
pub fn is_valid_launcher_path(path: &Path, expected: &str) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    file_name.eq_ignore_ascii_case(expected) && path.is_file()
}

/// Observes the companion launcher process and starts it at most once.
///
/// The launcher is never tuned. If it disappears after having been
/// observed running, the surrounding system terminates rather than
/// restarting it indefinitely.
pub struct LauncherSupervisor {
    directory: Arc<dyn ProcessDirectory>,
    launcher_name: String,
    start_attempted: bool,
}

impl LauncherSupervisor {
    pub fn new(directory: Arc<dyn ProcessDirectory>, launcher_name: impl Into<String>) -> Self {
        Self {
            directory,
            launcher_name: launcher_name.into(),
            start_attempted: false,
        }
    }

    pub fn launcher_name(&self) -> &str {
        &self.launcher_name
    }

    pub fn is_launcher_running(&self) -> bool {
        self.directory.is_running(&self.launcher_name)
    }

    /// Start the launcher if it is not already running and a valid path is
    /// known. At most one spawn attempt per supervisor lifetime; never
    /// retried within a session.
    pub fn ensure_running(&mut self, path: Option<&Path>) -> StartOutcome {
        if self.is_launcher_running() {
            return StartOutcome::not_started("already running");
        }
        if self.start_attempted {
            return StartOutcome::not_started("start already attempted");
        }
        let Some(path) = path else {
            return StartOutcome::not_started("no launcher path configured");
        };
        if !is_valid_launcher_path(path, &self.launcher_name) {
            return StartOutcome::failed(TuneError::SpawnFailure(format!(
                "{} is not a valid {} path",
                path.display(),
                self.launcher_name
            )));
        }

        self.start_attempted = true;
        match spawn_detached(path) {
            Ok(()) => {
                info!(path = %path.display(), "launcher started");
                StartOutcome::spawned()
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "launcher start failed");
                StartOutcome::failed(error)
            }
        }
    }
}

/// Spawn as a detached child with its working directory set to its own
/// folder, so the launcher resolves its relative resources.
fn spawn_detached(path: &Path) -> Result<(), TuneError> {
    let mut command = Command::new(path);
    if let Some(parent) = path.parent() {
        command.current_dir(parent);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};
        command.creation_flags(DETACHED_PROCESS.0 | CREATE_NEW_PROCESS_GROUP.0);
    }

    command
        .spawn()
        .map(drop)
        .map_err(|error| TuneError::SpawnFailure(format!("{}: {error}", path.display())))
}
