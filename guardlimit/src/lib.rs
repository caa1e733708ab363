//! Resource limiting for anti-cheat guard processes.
//!
//! This crate periodically discovers a small set of named guard processes
//! and nudges their scheduling characteristics — idle priority class, an
//! execution-speed power-throttling hint, and CPU affinity pinned to the
//! last logical core — so they stay off the machine's performance cores.
//! Reapplication to the same pid is rate-limited by a cooldown window. A
//! companion launcher process is observed (and started at most once) but
//! never tuned.
//!
//! The OS primitives are Windows-specific; on other platforms every tuning
//! call reports a typed [`TuneError::PlatformUnsupported`] failure instead
//! of attempting anything.

use std::time::Duration;

pub mod directory;
pub mod errors;
pub mod monitor;
pub mod platforms;
pub mod scheduler;
pub mod supervisor;
pub mod tuner;
pub mod types;

#[cfg(test)]
mod tests;

pub use directory::{ProcessDirectory, SysinfoDirectory};
pub use errors::TuneError;
pub use monitor::{Monitor, MonitorConfig, MonitorHandle};
pub use platforms::{create_platform, PlatformOps};
pub use scheduler::{TuningScheduler, DEFAULT_REAPPLY_AFTER};
pub use supervisor::{is_valid_launcher_path, LauncherSupervisor};
pub use tuner::ResourceTuner;
pub use types::{
    LauncherPresence, MonitorCommand, MonitorEvent, OpOutcome, ProcessMatch, ScanResult, ScanRow,
    StartOutcome, StopReason, TargetSet,
};

/// Executable names of the guard processes that get tuned.
pub const GUARD_PROCESS_NAMES: [&str; 2] = ["SGuard64.exe", "SGuardSvc64.exe"];

/// Executable name of the companion launcher. Observed, never tuned.
pub const LAUNCHER_PROCESS_NAME: &str = "wegame.exe";

/// Default cadence of the background scan loop.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
