//! Notification-area icon
//!
//! Wraps `Shell_NotifyIconW` with RAII cleanup. Icons are built from
//! tiny-skia pixmaps, so no `.ico` resources are needed.

use std::ffi::c_void;

use tiny_skia::Pixmap;
use windows::Win32::Foundation::{HWND, TRUE};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, CreateBitmap, CreateDIBSection, DIB_RGB_COLORS,
    DeleteObject, GetDC, HBITMAP, HGDIOBJ, ReleaseDC,
};
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIIF_INFO, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NOTIFYICONDATAW, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateIconIndirect, DestroyIcon, HICON, ICONINFO,
};

use crate::ui::icon::to_bgra;

#[derive(Debug, thiserror::Error)]
pub enum TrayError {
    #[error("Shell_NotifyIcon refused to add the tray icon")]
    AddFailed,

    #[error("Failed to create icon bitmap")]
    BitmapCreationFailed,

    #[error("Failed to create icon from bitmap")]
    IconCreationFailed,
}

/// Owned `HICON`, destroyed on drop
#[derive(Debug)]
struct OwnedIcon(HICON);

impl Drop for OwnedIcon {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyIcon(self.0);
        }
    }
}

/// Tray icon bound to a window
pub struct TrayIcon {
    hwnd: HWND,
    id: u32,
    callback_message: u32,
    icon: OwnedIcon,
    tooltip: String,
}

impl TrayIcon {
    /// Adds the icon to the notification area
    ///
    /// Mouse events on the icon arrive at `hwnd` as `callback_message`.
    pub fn add(
        hwnd: HWND,
        id: u32,
        callback_message: u32,
        pixmap: &Pixmap,
        tooltip: &str,
    ) -> Result<Self, TrayError> {
        let mut tray = Self {
            hwnd,
            id,
            callback_message,
            icon: icon_from_pixmap(pixmap)?,
            tooltip: tooltip.to_string(),
        };
        tray.register()?;
        Ok(tray)
    }

    /// Adds the icon again after Explorer restarted
    pub fn register(&mut self) -> Result<(), TrayError> {
        let mut data = self.base_data();
        data.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
        data.uCallbackMessage = self.callback_message;
        data.hIcon = self.icon.0;
        copy_wide(&mut data.szTip, &self.tooltip);

        if unsafe { Shell_NotifyIconW(NIM_ADD, &data) }.as_bool() {
            Ok(())
        } else {
            Err(TrayError::AddFailed)
        }
    }

    /// Replaces the icon image and tooltip
    pub fn update(&mut self, pixmap: &Pixmap, tooltip: &str) -> Result<(), TrayError> {
        let icon = icon_from_pixmap(pixmap)?;

        let mut data = self.base_data();
        data.uFlags = NIF_ICON | NIF_TIP;
        data.hIcon = icon.0;
        copy_wide(&mut data.szTip, tooltip);

        if !unsafe { Shell_NotifyIconW(NIM_MODIFY, &data) }.as_bool() {
            tracing::warn!("Shell_NotifyIcon failed to update the tray icon");
        }

        // The old icon is destroyed only after the shell has the new one
        self.icon = icon;
        self.tooltip = tooltip.to_string();
        Ok(())
    }

    /// Shows a balloon notification next to the icon
    pub fn notify(&self, title: &str, message: &str) {
        let mut data = self.base_data();
        data.uFlags = NIF_INFO;
        data.dwInfoFlags = NIIF_INFO;
        copy_wide(&mut data.szInfoTitle, title);
        copy_wide(&mut data.szInfo, message);

        if !unsafe { Shell_NotifyIconW(NIM_MODIFY, &data) }.as_bool() {
            tracing::warn!("Shell_NotifyIcon failed to show a balloon");
        }
    }

    fn base_data(&self) -> NOTIFYICONDATAW {
        NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.hwnd,
            uID: self.id,
            ..Default::default()
        }
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        let data = self.base_data();
        unsafe {
            Shell_NotifyIconW(NIM_DELETE, &data);
        }
    }
}

/// Copies `text` into a fixed-size, NUL-terminated UTF-16 buffer, truncating
fn copy_wide(buffer: &mut [u16], text: &str) {
    let capacity = buffer.len().saturating_sub(1);
    let mut written = 0;
    for (slot, unit) in buffer.iter_mut().zip(text.encode_utf16().take(capacity)) {
        *slot = unit;
        written += 1;
    }
    if let Some(terminator) = buffer.get_mut(written) {
        *terminator = 0;
    }
}

/// Builds an `HICON` from a premultiplied RGBA pixmap
fn icon_from_pixmap(pixmap: &Pixmap) -> Result<OwnedIcon, TrayError> {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let bgra = to_bgra(pixmap);

    unsafe {
        let screen_dc = GetDC(HWND(0));

        let mut bitmap_info = BITMAPINFO::default();
        bitmap_info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            biHeight: -height, // top-down bitmap so we can copy directly
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };

        let mut pixel_ptr: *mut c_void = std::ptr::null_mut();
        let color = CreateDIBSection(screen_dc, &bitmap_info, DIB_RGB_COLORS, &mut pixel_ptr, None, 0);
        ReleaseDC(HWND(0), screen_dc);

        let color = match color {
            Ok(bitmap) if !pixel_ptr.is_null() => bitmap,
            Ok(bitmap) => {
                delete_bitmap(bitmap);
                return Err(TrayError::BitmapCreationFailed);
            }
            Err(_) => return Err(TrayError::BitmapCreationFailed),
        };

        std::slice::from_raw_parts_mut(pixel_ptr as *mut u8, bgra.len()).copy_from_slice(&bgra);

        // Alpha comes from the colour bitmap; the mask only has to exist
        let mask_bits = vec![0u8; ((width + 15) / 16 * 2 * height) as usize];
        let mask = CreateBitmap(width, height, 1, 1, Some(mask_bits.as_ptr() as *const c_void));
        if mask.0 == 0 {
            delete_bitmap(color);
            return Err(TrayError::BitmapCreationFailed);
        }

        let info = ICONINFO {
            fIcon: TRUE,
            xHotspot: 0,
            yHotspot: 0,
            hbmMask: mask,
            hbmColor: color,
        };
        let icon = CreateIconIndirect(&info);

        delete_bitmap(mask);
        delete_bitmap(color);

        icon.map(OwnedIcon).map_err(|_| TrayError::IconCreationFailed)
    }
}

unsafe fn delete_bitmap(bitmap: HBITMAP) {
    let object: HGDIOBJ = bitmap.into();
    unsafe {
        DeleteObject(object);
    }
}
