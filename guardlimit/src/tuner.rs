//! Application of the two resource-shaping operations to a single process.

use std::sync::Arc;

use tracing::debug;

use crate::errors::TuneError;
use crate::platforms::PlatformOps;
use crate::types::OpOutcome;

/// Stateless facade over the platform backend. Every failure is an
/// ordinary outcome, never a panic or a fatal error.
#[derive(Clone)]
pub struct ResourceTuner {
    ops: Arc<dyn PlatformOps>,
}

impl ResourceTuner {
    pub fn new(ops: Arc<dyn PlatformOps>) -> Self {
        Self { ops }
    }

    /// Lower the scheduling priority class to idle and request
    /// execution-speed power throttling.
    ///
    /// Both sub-steps must succeed for an ok outcome. A throttling failure
    /// after priority succeeded leaves the lowered priority in place; the
    /// partial effect is accepted, not rolled back.
    pub fn lower_priority_and_throttle(&self, pid: u32) -> OpOutcome {
        match self.ops.set_low_priority_and_throttle(pid) {
            Ok(()) => OpOutcome::success("ok (priority=idle + power_throttling=execution_speed)"),
            Err(error) => {
                debug!(pid, %error, "efficiency tuning failed");
                OpOutcome::failure(error)
            }
        }
    }

    /// Restrict the process's allowed CPU set to the highest-indexed
    /// logical CPU. The CPU count is re-read on every attempt; topology
    /// is assumed static but hot-plug must not crash. Idempotent.
    pub fn pin_to_last_logical_core(&self, pid: u32) -> OpOutcome {
        let count = match self.ops.logical_cpu_count() {
            Ok(count) => count,
            Err(error) => return OpOutcome::failure(error),
        };
        if count == 0 {
            return OpOutcome::failure(TuneError::TopologyUnknown(
                "cannot determine logical CPU count".to_string(),
            ));
        }
        let last = count - 1;

        if let Err(error) = self.ops.open_process_query(pid) {
            debug!(pid, %error, "affinity target is not reachable");
            return OpOutcome::failure(error);
        }

        match self.ops.set_affinity(pid, last) {
            Ok(()) => OpOutcome::success(format!("ok (cpu_count={count} affinity=[{last}])")),
            Err(error) => {
                debug!(pid, %error, "affinity tuning failed");
                OpOutcome::failure(error)
            }
        }
    }
}
