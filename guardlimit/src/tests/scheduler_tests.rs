use std::sync::Arc;
use std::time::Duration;

use super::{FakeDirectory, FakeOps};
use crate::errors::TuneError;
use crate::scheduler::TuningScheduler;
use crate::tuner::ResourceTuner;
use crate::types::TargetSet;

fn scheduler_with(
    directory: Arc<FakeDirectory>,
    ops: Arc<FakeOps>,
    window: Duration,
) -> TuningScheduler {
    TuningScheduler::new(directory, ResourceTuner::new(ops), window)
}

fn guard_targets() -> TargetSet {
    TargetSet::new(["SGuard64.exe", "SGuardSvc64.exe"])
}

#[test]
fn first_scan_applies_to_every_match() {
    let directory = Arc::new(FakeDirectory::new([
        ("SGuard64.exe", 1001),
        ("SGuardSvc64.exe", 1002),
    ]));
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory, ops.clone(), Duration::from_secs(300));

    let result = scheduler.scan(&guard_targets());

    assert_eq!(result.rows.len(), 2);
    assert!(result.rows.iter().all(|row| row.did_apply));
    assert!(result
        .rows
        .iter()
        .all(|row| row.efficiency.as_ref().is_some_and(|o| o.ok)));
    assert!(result
        .rows
        .iter()
        .all(|row| row.affinity.as_ref().is_some_and(|o| o.ok)));
    assert_eq!(ops.efficiency_count(1001), 1);
    assert_eq!(ops.efficiency_count(1002), 1);
    assert_eq!(ops.affinity_count(1001), 1);
    assert_eq!(ops.affinity_count(1002), 1);
}

#[test]
fn second_scan_within_cooldown_is_skipped() {
    let directory = Arc::new(FakeDirectory::new([
        ("SGuard64.exe", 1001),
        ("SGuardSvc64.exe", 1002),
    ]));
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory, ops.clone(), Duration::from_secs(300));

    scheduler.scan(&guard_targets());
    let second = scheduler.scan(&guard_targets());

    assert_eq!(second.rows.len(), 2);
    for row in &second.rows {
        assert!(!row.did_apply);
        assert!(row.efficiency.is_none());
        assert!(row.affinity.is_none());
    }
    // The tuning primitives were not invoked again.
    assert_eq!(ops.efficiency_count(1001), 1);
    assert_eq!(ops.efficiency_count(1002), 1);
    assert_eq!(ops.affinity_count(1001), 1);
    assert_eq!(ops.affinity_count(1002), 1);
}

#[test]
fn reapplies_once_cooldown_elapsed() {
    let directory = Arc::new(FakeDirectory::new([
        ("SGuard64.exe", 1001),
        ("SGuardSvc64.exe", 1002),
    ]));
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory, ops.clone(), Duration::from_secs(5));

    scheduler.scan(&guard_targets());
    scheduler.backdate(1001, Duration::from_secs(5));
    let second = scheduler.scan(&guard_targets());

    let row_1001 = second.rows.iter().find(|row| row.pid == 1001).unwrap();
    let row_1002 = second.rows.iter().find(|row| row.pid == 1002).unwrap();
    assert!(row_1001.did_apply);
    assert!(!row_1002.did_apply);
    // Exactly one more invocation of each primitive, only for the due pid.
    assert_eq!(ops.efficiency_count(1001), 2);
    assert_eq!(ops.affinity_count(1001), 2);
    assert_eq!(ops.efficiency_count(1002), 1);
    assert_eq!(ops.affinity_count(1002), 1);
}

#[test]
fn failed_attempt_still_starts_cooldown() {
    let directory = Arc::new(FakeDirectory::new([("SGuard64.exe", 1001)]));
    let mut ops = FakeOps::new();
    ops.efficiency_error = Some(TuneError::AccessDenied("OpenProcess failed".to_string()));
    let ops = Arc::new(ops);
    let mut scheduler = scheduler_with(directory, ops.clone(), Duration::from_secs(300));

    let first = scheduler.scan(&guard_targets());
    let row = &first.rows[0];
    assert!(row.did_apply);
    let efficiency = row.efficiency.as_ref().unwrap();
    assert!(!efficiency.ok);
    assert!(matches!(efficiency.error, Some(TuneError::AccessDenied(_))));
    // The affinity outcome is independent of the efficiency failure.
    assert!(row.affinity.as_ref().is_some_and(|o| o.ok));

    // A protected process is not retried every cycle.
    let second = scheduler.scan(&guard_targets());
    assert!(!second.rows[0].did_apply);
    assert_eq!(ops.efficiency_count(1001), 1);
}

#[test]
fn vanished_process_does_not_hide_the_others() {
    let directory = Arc::new(FakeDirectory::new([
        ("SGuard64.exe", 1001),
        ("SGuardSvc64.exe", 1002),
    ]));
    let ops = Arc::new(FakeOps::new());
    ops.mark_missing(1002);
    let mut scheduler = scheduler_with(directory, ops.clone(), Duration::from_secs(300));

    let result = scheduler.scan(&guard_targets());

    assert_eq!(result.rows.len(), 2);
    let alive = result.rows.iter().find(|row| row.pid == 1001).unwrap();
    let gone = result.rows.iter().find(|row| row.pid == 1002).unwrap();
    assert!(alive.efficiency.as_ref().is_some_and(|o| o.ok));
    assert!(matches!(
        gone.efficiency.as_ref().unwrap().error,
        Some(TuneError::NoSuchProcess(_))
    ));
    assert!(matches!(
        gone.affinity.as_ref().unwrap().error,
        Some(TuneError::NoSuchProcess(_))
    ));
    // The exited process never reached the affinity primitive.
    assert_eq!(ops.affinity_count(1002), 0);
}

#[test]
fn match_is_case_insensitive() {
    let directory = Arc::new(FakeDirectory::new([("SGuard64.EXE", 77)]));
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory, ops, Duration::from_secs(300));

    let result = scheduler.scan(&TargetSet::new(["sguard64.exe"]));

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].pid, 77);
    assert!(result.rows[0].did_apply);
}

#[test]
fn no_matches_yields_empty_result() {
    let directory = Arc::new(FakeDirectory::empty());
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory, ops, Duration::from_secs(300));

    let result = scheduler.scan(&guard_targets());

    assert!(result.is_empty());
    assert_eq!(result.applied_count(), 0);
}

#[test]
fn stale_records_age_out() {
    let directory = Arc::new(FakeDirectory::new([("SGuard64.exe", 500)]));
    let ops = Arc::new(FakeOps::new());
    let mut scheduler = scheduler_with(directory.clone(), ops, Duration::from_secs(2));

    scheduler.scan(&guard_targets());
    assert_eq!(scheduler.tracked_pids(), vec![500]);

    // The process goes away and its record passes the staleness horizon.
    directory.remove_pid(500);
    scheduler.backdate(500, Duration::from_secs(9));
    scheduler.scan(&guard_targets());

    assert!(scheduler.tracked_pids().is_empty());
}
