use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes for the tuning and supervision operations.
///
/// Every variant is an ordinary, non-fatal outcome: a failed OS call is
/// data in a scan result, never control flow out of a scan cycle. The
/// variants are `Clone`/`PartialEq`/serde so outcomes can carry the kind
/// across the event queue and tests can assert on it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuneError {
    /// The caller lacks rights to open or modify the target process.
    /// Expected for protected anti-cheat services.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The process exited between discovery and application. A routine
    /// race, not an actionable error.
    #[error("No such process: {0}")]
    NoSuchProcess(String),

    /// The logical CPU count could not be determined; the affinity
    /// operation is aborted for this call only.
    #[error("CPU topology unknown: {0}")]
    TopologyUnknown(String),

    /// The current OS lacks the required tuning primitives. Every tuning
    /// call short-circuits to this without attempting anything.
    #[error("Unsupported platform: {0}")]
    PlatformUnsupported(String),

    /// The launcher executable could not be started.
    #[error("Launcher spawn failed: {0}")]
    SpawnFailure(String),

    /// Any other OS-level failure.
    #[error("Platform-specific error: {0}")]
    Platform(String),
}
