//! Process discovery by executable name.

use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

use crate::types::{ProcessMatch, TargetSet};

/// Enumerates live processes and matches them against target names.
///
/// Implementations must tolerate processes that exit mid-scan, cannot be
/// queried, or are defunct: those entries are silently skipped, never
/// reported, and never abort the enumeration. Result ordering is
/// unspecified.
pub trait ProcessDirectory: Send + Sync {
    /// Every currently running process whose executable name matches one
    /// of `targets`, case-insensitively. A name may match several pids.
    fn find_by_names(&self, targets: &TargetSet) -> Vec<ProcessMatch>;

    /// True if at least one process with the given name is alive.
    fn is_running(&self, name: &str) -> bool;
}

/// Directory backed by a fresh sysinfo snapshot per call.
///
/// Processes that exited mid-enumeration or are inaccessible simply don't
/// surface from the snapshot; they are routine races, not errors.
#[derive(Debug, Default)]
pub struct SysinfoDirectory;

impl SysinfoDirectory {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessDirectory for SysinfoDirectory {
    fn find_by_names(&self, targets: &TargetSet) -> Vec<ProcessMatch> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let mut found = Vec::new();
        for (pid, process) in system.processes() {
            let name = process.name().to_string_lossy();
            if targets.contains(name.as_ref()) {
                found.push(ProcessMatch {
                    name: name.into_owned(),
                    pid: pid.as_u32(),
                });
            }
        }
        debug!(matches = found.len(), "process discovery pass complete");
        found
    }

    fn is_running(&self, name: &str) -> bool {
        !self.find_by_names(&TargetSet::new([name])).is_empty()
    }
}
