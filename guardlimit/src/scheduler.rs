//! Cooldown bookkeeping and per-cycle scan orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::directory::ProcessDirectory;
use crate::tuner::ResourceTuner;
use crate::types::{ScanResult, ScanRow, TargetSet};

/// Default window between reapplications to the same pid.
pub const DEFAULT_REAPPLY_AFTER: Duration = Duration::from_secs(300);

/// Records not refreshed for this many cooldown windows are dropped.
const STALE_WINDOWS: u32 = 4;

/// Decides, per discovered process, whether the tuning calls are due, and
/// invokes them at most once per cooldown window.
///
/// The cooldown table is keyed by pid only and must be owned exclusively
/// by the single scanning task. If the OS hands a recycled pid to an
/// unrelated process within one window, reapplication is suppressed until
/// the record ages out.
pub struct TuningScheduler {
    directory: Arc<dyn ProcessDirectory>,
    tuner: ResourceTuner,
    reapply_after: Duration,
    last_applied: HashMap<u32, Instant>,
}

impl TuningScheduler {
    pub fn new(
        directory: Arc<dyn ProcessDirectory>,
        tuner: ResourceTuner,
        reapply_after: Duration,
    ) -> Self {
        Self {
            directory,
            tuner,
            reapply_after,
            last_applied: HashMap::new(),
        }
    }

    pub fn reapply_after(&self) -> Duration {
        self.reapply_after
    }

    /// One scan cycle: discover matches, skip the ones still in cooldown,
    /// tune the rest. Individual process failures are data in the result,
    /// never control flow; a scan cycle cannot fail.
    pub fn scan(&mut self, targets: &TargetSet) -> ScanResult {
        let now = Instant::now();
        self.prune_stale(now);

        let mut rows = Vec::new();
        for found in self.directory.find_by_names(targets) {
            let due = match self.last_applied.get(&found.pid) {
                Some(applied) => now.duration_since(*applied) >= self.reapply_after,
                None => true,
            };
            if !due {
                debug!(pid = found.pid, name = %found.name, "within cooldown, skipping");
                rows.push(ScanRow {
                    name: found.name,
                    pid: found.pid,
                    did_apply: false,
                    efficiency: None,
                    affinity: None,
                });
                continue;
            }

            let efficiency = self.tuner.lower_priority_and_throttle(found.pid);
            let affinity = self.tuner.pin_to_last_logical_core(found.pid);
            // Stamped even when both calls failed, so a protected process
            // is not hammered with access-denied attempts every cycle.
            self.last_applied.insert(found.pid, now);
            info!(
                pid = found.pid,
                name = %found.name,
                efficiency_ok = efficiency.ok,
                affinity_ok = affinity.ok,
                "tuning attempted"
            );
            rows.push(ScanRow {
                name: found.name,
                pid: found.pid,
                did_apply: true,
                efficiency: Some(efficiency),
                affinity: Some(affinity),
            });
        }
        ScanResult { rows }
    }

    /// Pids are recycled by the OS; a record nobody refreshed for several
    /// windows belongs to a process that is long gone.
    fn prune_stale(&mut self, now: Instant) {
        let Some(horizon) = self.reapply_after.checked_mul(STALE_WINDOWS) else {
            return;
        };
        if horizon.is_zero() {
            return;
        }
        self.last_applied
            .retain(|_, applied| now.duration_since(*applied) < horizon);
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, pid: u32, by: Duration) {
        if let Some(applied) = self.last_applied.get_mut(&pid) {
            *applied -= by;
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_pids(&self) -> Vec<u32> {
        self.last_applied.keys().copied().collect()
    }
}
