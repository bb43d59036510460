//! Tray context menu

use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, HMENU, MF_SEPARATOR, MF_STRING,
    PostMessageW, SetForegroundWindow, TPM_BOTTOMALIGN, TPM_RIGHTBUTTON, TrackPopupMenu, WM_NULL,
};
use windows::core::{HSTRING, PCWSTR};

use crate::app::command::{MenuEntry, tray_menu};

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("failed to build tray menu: {0}")]
    Build(windows::core::Error),
}

/// Destroys the popup menu on drop
struct MenuGuard(HMENU);

impl Drop for MenuGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyMenu(self.0);
        }
    }
}

/// Shows the tray menu at the cursor
///
/// The chosen item is delivered to `hwnd` as `WM_COMMAND`.
pub fn show_tray_menu(hwnd: HWND) -> Result<(), MenuError> {
    unsafe {
        let menu = MenuGuard(CreatePopupMenu().map_err(MenuError::Build)?);

        for entry in tray_menu() {
            match entry {
                MenuEntry::Item(command) => {
                    let label = HSTRING::from(command.label());
                    AppendMenuW(menu.0, MF_STRING, command.menu_id() as usize, &label)
                        .map_err(MenuError::Build)?;
                }
                MenuEntry::Separator => {
                    AppendMenuW(menu.0, MF_SEPARATOR, 0, PCWSTR::null())
                        .map_err(MenuError::Build)?;
                }
            }
        }

        let mut cursor = POINT::default();
        let _ = GetCursorPos(&mut cursor);

        // Without this the menu stays open when the user clicks elsewhere
        let _ = SetForegroundWindow(hwnd);
        let _ = TrackPopupMenu(
            menu.0,
            TPM_RIGHTBUTTON | TPM_BOTTOMALIGN,
            cursor.x,
            cursor.y,
            0,
            hwnd,
            None,
        );
        let _ = PostMessageW(hwnd, WM_NULL, WPARAM(0), LPARAM(0));
    }

    Ok(())
}
