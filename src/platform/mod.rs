//! Operating-system integration
//!
//! `clipboard` and `process` expose traits the controller is generic over and
//! build everywhere. The rest talks to Win32 directly and only exists on
//! Windows.

pub mod clipboard;
pub mod process;

#[cfg(windows)]
pub mod instance;
#[cfg(windows)]
pub mod menu;
#[cfg(windows)]
pub mod shell;
#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod window;
