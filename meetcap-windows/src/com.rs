//! Per-thread COM initialization.

use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use meetcap_core::models::error::CaptureError;

/// RAII guard for COM on the current thread.
///
/// `CoInitializeEx` returning `S_FALSE` (already initialized) still pairs
/// with a `CoUninitialize`, so nesting is safe.
pub(crate) struct ComSession;

impl ComSession {
    pub(crate) fn init() -> Result<Self, CaptureError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| {
                    CaptureError::SubsystemUnavailable(format!("CoInitializeEx failed: {e}"))
                })?;
        }
        Ok(Self)
    }
}

impl Drop for ComSession {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
