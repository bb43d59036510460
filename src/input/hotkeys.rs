//! Global hotkey registration
//!
//! Hotkeys are registered against the tray window, so `WM_HOTKEY` arrives
//! through the same message loop as the tray callbacks. Registrations are
//! released on drop.

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, MOD_NOREPEAT, RegisterHotKey, UnregisterHotKey,
};

use crate::app::command::{Command, HOTKEY_ADD_ID, HOTKEY_DOWNLOAD_ID};
use crate::domain::hotkey::{Hotkey, HotkeyBindings};

/// Hotkey registration errors
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("failed to register {hotkey}, it is probably in use by another program: {message}")]
    HotkeyRegistrationFailed { hotkey: Hotkey, message: String },

    #[error("hotkey id {id} is already registered")]
    DuplicateId { id: i32 },
}

struct Registration {
    id: i32,
    hotkey: Hotkey,
    command: Command,
}

/// The hotkeys currently registered for one window
pub struct HotkeyRegistry {
    hwnd: HWND,
    registered: Vec<Registration>,
}

impl HotkeyRegistry {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            registered: Vec::new(),
        }
    }

    /// Registers `hotkey` under `id`; `WM_HOTKEY` with that id maps to `command`
    pub fn register(&mut self, id: i32, hotkey: &Hotkey, command: Command) -> Result<(), HotkeyError> {
        if self.registered.iter().any(|registration| registration.id == id) {
            return Err(HotkeyError::DuplicateId { id });
        }

        // Holding the keys down must not queue the same command repeatedly
        let modifiers = HOT_KEY_MODIFIERS(hotkey.modifier_mask()) | MOD_NOREPEAT;

        unsafe { RegisterHotKey(self.hwnd, id, modifiers, hotkey.key().code()) }.map_err(
            |err| HotkeyError::HotkeyRegistrationFailed {
                hotkey: hotkey.clone(),
                message: err.message().to_string(),
            },
        )?;

        tracing::info!(id, ?command, "registered hotkey {hotkey}");
        self.registered.push(Registration {
            id,
            hotkey: hotkey.clone(),
            command,
        });
        Ok(())
    }

    /// Replaces every registration with `bindings`
    ///
    /// A hotkey that fails to register does not stop the other one; the
    /// failures are returned so the caller can tell the user.
    pub fn rebind(&mut self, bindings: &HotkeyBindings) -> Vec<HotkeyError> {
        self.unregister_all();

        [
            (HOTKEY_ADD_ID, &bindings.add, Command::AddFromClipboard),
            (HOTKEY_DOWNLOAD_ID, &bindings.download, Command::DownloadAll),
        ]
        .into_iter()
        .filter_map(|(id, hotkey, command)| self.register(id, hotkey, command).err())
        .collect()
    }

    /// Command bound to a `WM_HOTKEY` id
    pub fn command_for(&self, id: i32) -> Option<Command> {
        self.registered
            .iter()
            .find(|registration| registration.id == id)
            .map(|registration| registration.command)
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn unregister_all(&mut self) {
        for registration in self.registered.drain(..) {
            if let Err(err) = unsafe { UnregisterHotKey(self.hwnd, registration.id) } {
                tracing::warn!("failed to unregister {}: {err}", registration.hotkey);
            }
        }
    }
}

impl Drop for HotkeyRegistry {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A null window binds the hotkeys to the calling thread, so no window
    // is needed. Registration can still fail when another program owns the
    // combination; the registry must stay consistent either way.
    #[test]
    fn register_and_unregister_on_thread() {
        let hotkey = Hotkey::parse("ctrl+alt+shift+f24").unwrap();
        let mut registry = HotkeyRegistry::new(HWND(0));

        match registry.register(0x3F00, &hotkey, Command::DownloadAll) {
            Ok(()) => {
                assert_eq!(registry.command_for(0x3F00), Some(Command::DownloadAll));
                assert!(matches!(
                    registry.register(0x3F00, &hotkey, Command::DownloadAll),
                    Err(HotkeyError::DuplicateId { id: 0x3F00 })
                ));
                registry.unregister_all();
                assert!(registry.is_empty());
            }
            Err(err) => {
                println!("hotkey registration failed (expected on busy desktops): {err}");
                assert!(registry.is_empty());
            }
        }
    }

    #[test]
    fn unknown_id_has_no_command() {
        let registry = HotkeyRegistry::new(HWND(0));
        assert_eq!(registry.command_for(HOTKEY_ADD_ID), None);
    }
}
