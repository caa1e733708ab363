mod scheduler_tests;

use std::collections::HashSet;
use std::sync::Mutex;

use crate::directory::ProcessDirectory;
use crate::errors::TuneError;
use crate::platforms::PlatformOps;
use crate::types::{ProcessMatch, TargetSet};

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}

/// Directory whose contents tests mutate directly.
pub(crate) struct FakeDirectory {
    procs: Mutex<Vec<ProcessMatch>>,
}

impl FakeDirectory {
    pub fn new<I>(procs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, u32)>,
    {
        Self {
            procs: Mutex::new(
                procs
                    .into_iter()
                    .map(|(name, pid)| ProcessMatch {
                        name: name.to_string(),
                        pid,
                    })
                    .collect(),
            ),
        }
    }

    pub fn empty() -> Self {
        Self {
            procs: Mutex::new(Vec::new()),
        }
    }

    pub fn remove_name(&self, name: &str) {
        self.procs
            .lock()
            .unwrap()
            .retain(|process| !process.name.eq_ignore_ascii_case(name));
    }

    pub fn remove_pid(&self, pid: u32) {
        self.procs.lock().unwrap().retain(|process| process.pid != pid);
    }
}

impl ProcessDirectory for FakeDirectory {
    fn find_by_names(&self, targets: &TargetSet) -> Vec<ProcessMatch> {
        self.procs
            .lock()
            .unwrap()
            .iter()
            .filter(|process| targets.contains(&process.name))
            .cloned()
            .collect()
    }

    fn is_running(&self, name: &str) -> bool {
        self.procs
            .lock()
            .unwrap()
            .iter()
            .any(|process| process.name.eq_ignore_ascii_case(name))
    }
}

/// Platform backend with scripted failures and recorded calls.
pub(crate) struct FakeOps {
    pub cpu_count: usize,
    pub efficiency_error: Option<TuneError>,
    pub affinity_error: Option<TuneError>,
    pub missing_pids: Mutex<HashSet<u32>>,
    pub efficiency_calls: Mutex<Vec<u32>>,
    pub affinity_calls: Mutex<Vec<(u32, usize)>>,
}

impl FakeOps {
    pub fn new() -> Self {
        Self {
            cpu_count: 8,
            efficiency_error: None,
            affinity_error: None,
            missing_pids: Mutex::new(HashSet::new()),
            efficiency_calls: Mutex::new(Vec::new()),
            affinity_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_cpu_count(count: usize) -> Self {
        Self {
            cpu_count: count,
            ..Self::new()
        }
    }

    pub fn mark_missing(&self, pid: u32) {
        self.missing_pids.lock().unwrap().insert(pid);
    }

    pub fn efficiency_count(&self, pid: u32) -> usize {
        self.efficiency_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| **called == pid)
            .count()
    }

    pub fn affinity_count(&self, pid: u32) -> usize {
        self.affinity_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| *called == pid)
            .count()
    }
}

impl PlatformOps for FakeOps {
    fn set_low_priority_and_throttle(&self, pid: u32) -> Result<(), TuneError> {
        if self.missing_pids.lock().unwrap().contains(&pid) {
            return Err(TuneError::NoSuchProcess(format!("pid {pid} is gone")));
        }
        self.efficiency_calls.lock().unwrap().push(pid);
        match &self.efficiency_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn set_affinity(&self, pid: u32, core_index: usize) -> Result<(), TuneError> {
        self.affinity_calls.lock().unwrap().push((pid, core_index));
        match &self.affinity_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn logical_cpu_count(&self) -> Result<usize, TuneError> {
        Ok(self.cpu_count)
    }

    fn open_process_query(&self, pid: u32) -> Result<(), TuneError> {
        if self.missing_pids.lock().unwrap().contains(&pid) {
            return Err(TuneError::NoSuchProcess(format!("pid {pid} is gone")));
        }
        Ok(())
    }
}
