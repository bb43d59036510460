//! Opening files and folders with their default handler

use std::path::{Path, PathBuf};

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
use windows::core::{HSTRING, PCWSTR, w};

#[derive(Debug, thiserror::Error)]
#[error("failed to open {path} (ShellExecute code {code})")]
pub struct OpenError {
    pub path: PathBuf,
    pub code: isize,
}

/// `ShellExecuteW("open")` on a file or folder
pub fn open_path(path: &Path) -> Result<(), OpenError> {
    let file = HSTRING::from(path);
    let result = unsafe {
        ShellExecuteW(
            HWND(0),
            w!("open"),
            &file,
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    // Values above 32 mean success
    if result.0 > 32 {
        Ok(())
    } else {
        Err(OpenError {
            path: path.to_path_buf(),
            code: result.0,
        })
    }
}
