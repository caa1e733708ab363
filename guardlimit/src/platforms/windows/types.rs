//! RAII wrappers for Win32 handles.

use windows::Win32::Foundation::{CloseHandle, HANDLE};

/// Closes the wrapped process handle on drop.
pub(crate) struct HandleGuard(pub(crate) HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        unsafe {
            if !self.0.is_invalid() {
                let _ = CloseHandle(self.0);
            }
        }
    }
}
