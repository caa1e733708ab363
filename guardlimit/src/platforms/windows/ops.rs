//! Win32 process tuning: priority class, power throttling, affinity.

use std::ffi::c_void;

use tracing::debug;
use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, HANDLE};
use windows::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};
use windows::Win32::System::Threading::{
    OpenProcess, ProcessPowerThrottling, SetPriorityClass, SetProcessAffinityMask,
    SetProcessInformation, IDLE_PRIORITY_CLASS, PROCESS_ACCESS_RIGHTS,
    PROCESS_POWER_THROTTLING_CURRENT_VERSION, PROCESS_POWER_THROTTLING_EXECUTION_SPEED,
    PROCESS_POWER_THROTTLING_STATE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SET_INFORMATION,
};

use super::types::HandleGuard;
use crate::errors::TuneError;
use crate::platforms::PlatformOps;

/// Platform backend using the Win32 process APIs directly.
#[derive(Debug, Default)]
pub struct WindowsOps;

impl WindowsOps {
    pub fn new() -> Self {
        Self
    }
}

/// Opens `pid` with the given rights, classifying the failure.
///
/// `OpenProcess` reports an exited pid as `ERROR_INVALID_PARAMETER`;
/// protected processes (elevated anti-cheat services) as
/// `ERROR_ACCESS_DENIED`.
fn open_process(pid: u32, access: PROCESS_ACCESS_RIGHTS) -> Result<HANDLE, TuneError> {
    let handle = unsafe { OpenProcess(access, false, pid) };
    handle.map_err(|error| {
        let code = error.code();
        if code == ERROR_ACCESS_DENIED.to_hresult() {
            TuneError::AccessDenied(format!("OpenProcess failed (pid={pid}): {error}"))
        } else if code == ERROR_INVALID_PARAMETER.to_hresult() {
            TuneError::NoSuchProcess(format!("pid {pid} is gone: {error}"))
        } else {
            TuneError::Platform(format!("OpenProcess failed (pid={pid}): {error}"))
        }
    })
}

fn map_set_error(operation: &str, pid: u32, error: windows::core::Error) -> TuneError {
    if error.code() == ERROR_ACCESS_DENIED.to_hresult() {
        TuneError::AccessDenied(format!("{operation} failed (pid={pid}): {error}"))
    } else {
        TuneError::Platform(format!("{operation} failed (pid={pid}): {error}"))
    }
}

impl PlatformOps for WindowsOps {
    fn set_low_priority_and_throttle(&self, pid: u32) -> Result<(), TuneError> {
        let handle = open_process(
            pid,
            PROCESS_SET_INFORMATION | PROCESS_QUERY_LIMITED_INFORMATION,
        )?;
        let _guard = HandleGuard(handle);

        unsafe {
            SetPriorityClass(handle, IDLE_PRIORITY_CLASS)
                .map_err(|e| map_set_error("SetPriorityClass", pid, e))?;

            let state = PROCESS_POWER_THROTTLING_STATE {
                Version: PROCESS_POWER_THROTTLING_CURRENT_VERSION,
                ControlMask: PROCESS_POWER_THROTTLING_EXECUTION_SPEED,
                StateMask: PROCESS_POWER_THROTTLING_EXECUTION_SPEED,
            };
            SetProcessInformation(
                handle,
                ProcessPowerThrottling,
                &state as *const PROCESS_POWER_THROTTLING_STATE as *const c_void,
                std::mem::size_of::<PROCESS_POWER_THROTTLING_STATE>() as u32,
            )
            .map_err(|e| map_set_error("SetProcessInformation(ProcessPowerThrottling)", pid, e))?;
        }

        debug!(pid, "idle priority and execution-speed throttling set");
        Ok(())
    }

    fn set_affinity(&self, pid: u32, core_index: usize) -> Result<(), TuneError> {
        // Affinity masks address a single processor group; an index past
        // the mask width cannot be expressed.
        let mask = 1usize.checked_shl(core_index as u32).ok_or_else(|| {
            TuneError::Platform(format!(
                "logical CPU {core_index} is outside the affinity mask width"
            ))
        })?;

        let handle = open_process(
            pid,
            PROCESS_SET_INFORMATION | PROCESS_QUERY_LIMITED_INFORMATION,
        )?;
        let _guard = HandleGuard(handle);

        unsafe {
            SetProcessAffinityMask(handle, mask)
                .map_err(|e| map_set_error("SetProcessAffinityMask", pid, e))?;
        }

        debug!(pid, core_index, "affinity restricted to one logical CPU");
        Ok(())
    }

    fn logical_cpu_count(&self) -> Result<usize, TuneError> {
        let mut info = SYSTEM_INFO::default();
        unsafe { GetSystemInfo(&mut info) };
        Ok(info.dwNumberOfProcessors as usize)
    }

    fn open_process_query(&self, pid: u32) -> Result<(), TuneError> {
        // PROCESS_QUERY_LIMITED_INFORMATION works across privilege
        // boundaries, so a protected-but-alive process still passes.
        let handle = open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION)?;
        drop(HandleGuard(handle));
        Ok(())
    }
}
