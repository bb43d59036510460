//! Single-instance guard
//!
//! A named mutex keeps a second copy from registering the same hotkeys and
//! adding a second tray icon.

use windows::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, WIN32_ERROR};
use windows::Win32::System::Threading::CreateMutexW;
use windows::core::w;

// Matches the Win32 ERROR_ALREADY_EXISTS (183) code.
const ALREADY_EXISTS_ERR: WIN32_ERROR = WIN32_ERROR(183);

#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("another instance is already running")]
    AlreadyRunning,
    #[error("failed to create instance mutex: {0}")]
    Win32Error(String),
}

/// Holds the instance mutex until dropped
#[derive(Debug)]
pub struct SingleInstance {
    handle: HANDLE,
}

impl SingleInstance {
    pub fn acquire() -> Result<Self, InstanceError> {
        unsafe {
            let handle = CreateMutexW(None, true, w!("Local\\TrayDownloaderSingleInstance"))
                .map_err(|e| InstanceError::Win32Error(format!("{:?}", e)))?;

            match GetLastError() {
                Err(err) if err.code() == ALREADY_EXISTS_ERR.to_hresult() => {
                    let _ = CloseHandle(handle);
                    Err(InstanceError::AlreadyRunning)
                }
                _ => Ok(Self { handle }),
            }
        }
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}
