//! Background monitoring loop and its outbound event stream.
//!
//! One tokio task owns the scheduler and supervisor; everything it learns
//! flows out over a queue of discrete event records. The only inbound
//! control is a command queue. No state is shared across the task
//! boundary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::directory::{ProcessDirectory, SysinfoDirectory};
use crate::platforms::{create_platform, PlatformOps};
use crate::scheduler::{TuningScheduler, DEFAULT_REAPPLY_AFTER};
use crate::supervisor::LauncherSupervisor;
use crate::tuner::ResourceTuner;
use crate::types::{LauncherPresence, MonitorCommand, MonitorEvent, StopReason, TargetSet};
use crate::{DEFAULT_SCAN_INTERVAL, GUARD_PROCESS_NAMES, LAUNCHER_PROCESS_NAME};

/// Configuration for the background loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Process names to discover and tune.
    pub targets: TargetSet,
    /// Executable name of the launcher to observe (never tuned).
    pub launcher_name: String,
    /// Optional path to the launcher executable, consumed from an external
    /// config store. Never written by the core.
    pub launcher_path: Option<PathBuf>,
    /// Start the launcher once at startup if it is not running.
    pub autostart_launcher: bool,
    /// Seconds between scan cycles.
    pub scan_interval: Duration,
    /// Cooldown window handed to the scheduler.
    pub reapply_after: Duration,
    /// How long a freshly started launcher may take to appear before the
    /// presence signal reports it absent.
    pub launcher_grace: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: TargetSet::new(GUARD_PROCESS_NAMES),
            launcher_name: LAUNCHER_PROCESS_NAME.to_string(),
            launcher_path: None,
            autostart_launcher: true,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            reapply_after: DEFAULT_REAPPLY_AFTER,
            launcher_grace: Duration::from_secs(10),
        }
    }
}

/// Entry point for the background loop.
pub struct Monitor;

impl Monitor {
    /// Spawn the loop against the real system: sysinfo discovery and the
    /// platform backend for the current OS.
    pub fn spawn(config: MonitorConfig) -> MonitorHandle {
        Self::spawn_with(config, Arc::new(SysinfoDirectory::new()), create_platform())
    }

    /// Spawn with explicit collaborators.
    pub fn spawn_with(
        config: MonitorConfig,
        directory: Arc<dyn ProcessDirectory>,
        ops: Arc<dyn PlatformOps>,
    ) -> MonitorHandle {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_loop(config, directory, ops, event_tx, command_rx));
        MonitorHandle {
            events,
            commands,
            task,
        }
    }
}

/// Receiving half of the monitor's event queue plus the inbound command
/// queue.
pub struct MonitorHandle {
    events: mpsc::UnboundedReceiver<MonitorEvent>,
    commands: mpsc::UnboundedSender<MonitorCommand>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Next event from the loop; `None` once the loop has ended and the
    /// queue is drained.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events.recv().await
    }

    /// Ask the loop to stop. Honored within one tick.
    pub fn stop(&self) {
        let _ = self.commands.send(MonitorCommand::Stop);
    }

    /// Wait for the loop task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run_loop(
    config: MonitorConfig,
    directory: Arc<dyn ProcessDirectory>,
    ops: Arc<dyn PlatformOps>,
    events: mpsc::UnboundedSender<MonitorEvent>,
    mut commands: mpsc::UnboundedReceiver<MonitorCommand>,
) {
    let mut scheduler = TuningScheduler::new(
        directory.clone(),
        ResourceTuner::new(ops),
        config.reapply_after,
    );
    let mut supervisor = LauncherSupervisor::new(directory, config.launcher_name.clone());

    let mut presence = LauncherPresence::Unknown;
    let mut seen_running = false;
    let mut optimized_reported = false;
    let mut grace_left = Duration::ZERO;

    // Start the launcher at most once per run.
    if config.autostart_launcher && !supervisor.is_launcher_running() {
        let outcome = supervisor.ensure_running(config.launcher_path.as_deref());
        if outcome.started {
            grace_left = config.launcher_grace;
            presence = emit_presence(&events, presence, LauncherPresence::Starting);
        } else if outcome.error.is_some() {
            warn!(detail = %outcome.detail, "launcher start failed");
            presence = emit_presence(&events, presence, LauncherPresence::StartFailed);
        }
    }

    // A short tick keeps shutdown prompt; scans run on their own cadence.
    let tick = Duration::from_secs(1);
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut until_scan = Duration::ZERO;

    loop {
        interval.tick().await;

        let mut stop_requested = false;
        while let Ok(command) = commands.try_recv() {
            match command {
                MonitorCommand::Stop => stop_requested = true,
            }
        }
        if stop_requested {
            info!("monitor stop requested");
            let _ = events.send(MonitorEvent::Stopped(StopReason::StopRequested));
            return;
        }

        if supervisor.is_launcher_running() {
            seen_running = true;
            grace_left = Duration::ZERO;
            presence = emit_presence(&events, presence, LauncherPresence::Running);
        } else if seen_running {
            // Gone after having been observed running: the one terminal
            // transition. The launcher is not restarted.
            info!("launcher exited, stopping monitor");
            emit_presence(&events, presence, LauncherPresence::NotRunning);
            let _ = events.send(MonitorEvent::Stopped(StopReason::LauncherExited));
            return;
        } else if grace_left > Duration::ZERO {
            grace_left = grace_left.saturating_sub(tick);
        } else if presence != LauncherPresence::StartFailed {
            presence = emit_presence(&events, presence, LauncherPresence::NotRunning);
        }

        if until_scan.is_zero() {
            until_scan = config.scan_interval;
            let result = scheduler.scan(&config.targets);
            if !optimized_reported && result.applied_count() > 0 {
                optimized_reported = true;
                let _ = events.send(MonitorEvent::GuardOptimized);
            }
            let _ = events.send(MonitorEvent::Scan(result));
        }
        until_scan = until_scan.saturating_sub(tick);
    }
}

fn emit_presence(
    events: &mpsc::UnboundedSender<MonitorEvent>,
    current: LauncherPresence,
    next: LauncherPresence,
) -> LauncherPresence {
    if current != next {
        debug!(%next, "launcher presence changed");
        let _ = events.send(MonitorEvent::LauncherPresence(next));
    }
    next
}
