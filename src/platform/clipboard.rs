//! Clipboard access
//!
//! The controller only sees `ClipboardSource`; the Win32 implementation
//! reads `CF_UNICODETEXT` and can synthesize Ctrl+C to copy the current
//! selection first.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard is held by another program")]
    Busy,

    #[error("failed to lock clipboard memory")]
    LockFailed,

    #[error("failed to send copy keystroke")]
    CopyFailed,
}

/// Something that can hand out the clipboard text
pub trait ClipboardSource {
    /// Current clipboard text, `None` when it holds no text
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;

    /// Copies the current selection into the clipboard and waits `delay`
    fn copy_selection(&mut self, delay: Duration) -> Result<(), ClipboardError>;
}

#[cfg(windows)]
pub use self::win32::SystemClipboard;

#[cfg(windows)]
mod win32 {
    use std::thread;
    use std::time::Duration;

    use windows::Win32::Foundation::{HANDLE, HGLOBAL, HWND};
    use windows::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, GetClipboardData, IsClipboardFormatAvailable,
        OpenClipboard,
    };
    use windows::Win32::System::Memory::{GlobalLock, GlobalUnlock};
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
        SendInput, VIRTUAL_KEY, VK_CONTROL,
    };

    use super::{ClipboardError, ClipboardSource};

    // Matches the Win32 CF_UNICODETEXT clipboard format.
    const CF_UNICODETEXT: u32 = 13;
    const VK_C: VIRTUAL_KEY = VIRTUAL_KEY(0x43);
    const OPEN_ATTEMPTS: u32 = 5;

    /// Win32 clipboard reader
    #[derive(Debug, Default)]
    pub struct SystemClipboard;

    impl SystemClipboard {
        pub fn new() -> Self {
            Self
        }
    }

    /// Keeps the clipboard open until dropped
    struct OpenGuard;

    impl OpenGuard {
        fn open() -> Result<Self, ClipboardError> {
            // Another program may hold the clipboard for a moment after a copy
            for attempt in 0..OPEN_ATTEMPTS {
                if unsafe { OpenClipboard(HWND(0)) }.is_ok() {
                    return Ok(Self);
                }
                if attempt + 1 < OPEN_ATTEMPTS {
                    thread::sleep(Duration::from_millis(20));
                }
            }
            Err(ClipboardError::Busy)
        }
    }

    impl Drop for OpenGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseClipboard();
            }
        }
    }

    /// Keeps a global memory block locked until dropped
    struct LockGuard {
        memory: HGLOBAL,
        ptr: *const u16,
    }

    impl LockGuard {
        fn lock(handle: HANDLE) -> Result<Self, ClipboardError> {
            let memory = HGLOBAL(handle.0 as _);
            let ptr = unsafe { GlobalLock(memory) } as *const u16;
            if ptr.is_null() {
                return Err(ClipboardError::LockFailed);
            }
            Ok(Self { memory, ptr })
        }

        /// Reads the NUL-terminated UTF-16 text the block holds
        fn text(&self) -> String {
            let mut len = 0usize;
            unsafe {
                while *self.ptr.add(len) != 0 {
                    len += 1;
                }
                let units = std::slice::from_raw_parts(self.ptr, len);
                String::from_utf16_lossy(units)
            }
        }
    }

    impl Drop for LockGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = GlobalUnlock(self.memory);
            }
        }
    }

    fn key_input(key: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: key,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl ClipboardSource for SystemClipboard {
        fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
            if unsafe { IsClipboardFormatAvailable(CF_UNICODETEXT) }.is_err() {
                return Ok(None);
            }

            let _open = OpenGuard::open()?;
            let handle = match unsafe { GetClipboardData(CF_UNICODETEXT) } {
                Ok(handle) if handle.0 != 0 => handle,
                _ => return Ok(None),
            };
            let lock = LockGuard::lock(handle)?;
            Ok(Some(lock.text()))
        }

        fn copy_selection(&mut self, delay: Duration) -> Result<(), ClipboardError> {
            {
                let _open = OpenGuard::open()?;
                unsafe {
                    let _ = EmptyClipboard();
                }
            }

            let no_flags = KEYBD_EVENT_FLAGS(0);
            let inputs = [
                key_input(VK_CONTROL, no_flags),
                key_input(VK_C, no_flags),
                key_input(VK_C, KEYEVENTF_KEYUP),
                key_input(VK_CONTROL, KEYEVENTF_KEYUP),
            ];
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
            if sent as usize != inputs.len() {
                return Err(ClipboardError::CopyFailed);
            }

            thread::sleep(delay);
            Ok(())
        }
    }
}
