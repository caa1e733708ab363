//! Typed platform capability behind the tuning primitives.

use std::sync::Arc;

use crate::errors::TuneError;

/// The OS calls the tuner needs, bound once at startup.
///
/// One concrete implementation per supported OS; everywhere else a stub
/// that reports [`TuneError::PlatformUnsupported`] for every call.
pub trait PlatformOps: Send + Sync {
    /// Set the process to the lowest standard priority class and request
    /// execution-speed power throttling. A priority failure short-circuits
    /// (throttling is not attempted); a throttling failure after priority
    /// succeeded is reported as-is and the lowered priority is not rolled
    /// back.
    fn set_low_priority_and_throttle(&self, pid: u32) -> Result<(), TuneError>;

    /// Restrict the process's allowed CPU set to exactly the given logical
    /// CPU index.
    fn set_affinity(&self, pid: u32, core_index: usize) -> Result<(), TuneError>;

    /// Number of logical CPUs visible to the OS, read fresh per call.
    fn logical_cpu_count(&self) -> Result<usize, TuneError>;

    /// Probe whether the process can be opened for query. Distinguishes a
    /// process that exited from one the caller may not touch.
    fn open_process_query(&self, pid: u32) -> Result<(), TuneError>;
}

pub mod unsupported;

#[cfg(target_os = "windows")]
pub mod windows;

/// Create the platform backend for the current OS.
pub fn create_platform() -> Arc<dyn PlatformOps> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::WindowsOps::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(unsupported::UnsupportedOps)
    }
}
