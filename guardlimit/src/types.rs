//! Result and event records exchanged between the core and its callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TuneError;

/// A process observed during one enumeration pass.
///
/// The OS owns the underlying process; it may exit at any moment after
/// being observed, and callers must treat that as a normal condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMatch {
    pub name: String,
    pub pid: u32,
}

/// Case-insensitive set of target executable names. Immutable per scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    names: Vec<String>,
}

impl TargetSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.names.iter().any(|target| *target == lowered)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Outcome of one tuning operation on one process.
///
/// `error` preserves the failure kind so callers and tests can discriminate
/// an access-denied process from one that simply exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpOutcome {
    pub ok: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TuneError>,
}

impl OpOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
            error: None,
        }
    }

    pub fn failure(error: TuneError) -> Self {
        Self {
            ok: false,
            detail: error.to_string(),
            error: Some(error),
        }
    }
}

/// Per-process outcome of one scan cycle.
///
/// `did_apply = false` means the process was matched but skipped by the
/// cooldown; the outcome fields are `None` in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRow {
    pub name: String,
    pub pid: u32,
    pub did_apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<OpOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<OpOutcome>,
}

/// Ordered per-process outcomes of one scan cycle. Ephemeral.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub rows: Vec<ScanRow>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn applied_count(&self) -> usize {
        self.rows.iter().filter(|row| row.did_apply).count()
    }
}

/// Outcome of a launcher start attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub started: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TuneError>,
}

impl StartOutcome {
    pub fn spawned() -> Self {
        Self {
            started: true,
            detail: "started".to_string(),
            error: None,
        }
    }

    pub fn not_started(detail: impl Into<String>) -> Self {
        Self {
            started: false,
            detail: detail.into(),
            error: None,
        }
    }

    pub fn failed(error: TuneError) -> Self {
        Self {
            started: false,
            detail: error.to_string(),
            error: Some(error),
        }
    }
}

/// Launcher liveness as last observed by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LauncherPresence {
    Running,
    NotRunning,
    Starting,
    StartFailed,
    Unknown,
}

impl fmt::Display for LauncherPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LauncherPresence::Running => "running",
            LauncherPresence::NotRunning => "not running",
            LauncherPresence::Starting => "starting",
            LauncherPresence::StartFailed => "start failed",
            LauncherPresence::Unknown => "unknown",
        };
        write!(f, "{text}")
    }
}

/// Why the monitor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// A `MonitorCommand::Stop` was received.
    StopRequested,
    /// The launcher disappeared after having been observed running. A
    /// deliberate terminal transition, not an error.
    LauncherExited,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::StopRequested => "stop requested",
            StopReason::LauncherExited => "launcher exited",
        };
        write!(f, "{text}")
    }
}

/// Outbound records from the monitor loop to a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonitorEvent {
    /// One scan cycle completed.
    Scan(ScanResult),
    /// The launcher presence signal changed.
    LauncherPresence(LauncherPresence),
    /// First scan that applied tuning to at least one process. Emitted
    /// once per monitor lifetime.
    GuardOptimized,
    /// The loop ended.
    Stopped(StopReason),
}

/// Inbound control for the monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    Stop,
}
