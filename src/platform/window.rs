//! Hidden tray window and message loop
//!
//! The window never shows. It owns the tray icon and the hotkey
//! registrations. Every message that means "the user wants something"
//! becomes a `Command` for the controller, and the returned `Effect`s are
//! applied here.

#![allow(unsafe_op_in_unsafe_fn)]

use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WIN32_ERROR, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CREATESTRUCTW, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    GWLP_USERDATA, GetMessageW, GetSystemMetrics, GetWindowLongPtrW, KillTimer, MSG,
    PostMessageW, PostQuitMessage, RegisterClassW, RegisterWindowMessageW, SM_CXSMICON,
    SetTimer, SetWindowLongPtrW, TranslateMessage, WINDOW_EX_STYLE, WM_APP, WM_CLOSE,
    WM_COMMAND, WM_CREATE, WM_DESTROY, WM_HOTKEY, WM_LBUTTONDBLCLK, WM_RBUTTONUP, WM_TIMER,
    WNDCLASSW, WS_OVERLAPPED,
};
use windows::core::{PCWSTR, w};

use crate::app::command::Command;
use crate::app::controller::{APP_TITLE, AppController, Effect, tooltip};
use crate::app::state::AppState;
use crate::input::hotkeys::HotkeyRegistry;
use crate::platform::clipboard::SystemClipboard;
use crate::platform::menu::show_tray_menu;
use crate::platform::process::ShellLauncher;
use crate::platform::shell::open_path;
use crate::platform::tray::{TrayError, TrayIcon};
use crate::ui::icon::{IconLayout, IconRenderer, RendererError};

pub type TrayController = AppController<SystemClipboard, ShellLauncher>;

/// Tray callback message
const WM_TRAY: u32 = WM_APP + 1;
const TRAY_ICON_ID: u32 = 1;
const STATUS_TIMER_ID: usize = 1;
/// How long the capture/dispatch colour stays on the icon
const STATUS_FLASH_MS: u32 = 400;
const DEFAULT_ICON_SIZE: u32 = 16;
// Matches the Win32 ERROR_CLASS_ALREADY_EXISTS (1410) code.
const CLASS_ALREADY_EXISTS_ERR: WIN32_ERROR = WIN32_ERROR(1410);

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to register tray window class")]
    ClassRegistrationFailed,
    #[error("Failed to create tray window")]
    WindowCreationFailed,
    #[error("Windows API error: {0}")]
    Win32Error(String),
    #[error(transparent)]
    Tray(#[from] TrayError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

struct WindowState {
    hwnd: HWND,
    controller: TrayController,
    renderer: IconRenderer,
    tray: Option<TrayIcon>,
    hotkeys: Option<HotkeyRegistry>,
    taskbar_created: u32,
    icon_size: u32,
}

/// Runs the tray until the user exits
pub fn run(controller: TrayController, renderer: IconRenderer) -> Result<(), WindowError> {
    let state = WindowState {
        hwnd: HWND(0),
        controller,
        renderer,
        tray: None,
        hotkeys: None,
        taskbar_created: 0,
        icon_size: DEFAULT_ICON_SIZE,
    };
    let state_ptr = Box::into_raw(Box::new(state));

    let result = unsafe { create_and_pump(state_ptr) };

    // The window is gone, nothing can reach the state through GWLP_USERDATA
    let _ = unsafe { Box::from_raw(state_ptr) };
    result
}

unsafe fn create_and_pump(state_ptr: *mut WindowState) -> Result<(), WindowError> {
    let module = GetModuleHandleW(PCWSTR::null())
        .map_err(|e| WindowError::Win32Error(format!("{:?}", e)))?;
    let instance: HINSTANCE = module.into();

    register_window_class(instance)?;

    let hwnd = CreateWindowExW(
        WINDOW_EX_STYLE(0),
        w!("TrayDownloaderWindow"),
        w!("YT Downloader"),
        WS_OVERLAPPED,
        0,
        0,
        0,
        0,
        None,
        None,
        instance,
        Some(state_ptr as *const _ as *mut _),
    );

    if hwnd.0 == 0 {
        return Err(WindowError::WindowCreationFailed);
    }

    if let Err(err) = (*state_ptr).start(hwnd) {
        let _ = DestroyWindow(hwnd);
        return Err(err);
    }

    let mut msg = MSG::default();
    loop {
        let result = GetMessageW(&mut msg, None, 0, 0);
        if result.0 == 0 {
            break;
        }
        if result.0 == -1 {
            return Err(WindowError::Win32Error("GetMessageW failed".to_string()));
        }
        TranslateMessage(&msg);
        DispatchMessageW(&msg);
    }

    tracing::info!("message loop finished");
    Ok(())
}

fn register_window_class(instance: HINSTANCE) -> Result<(), WindowError> {
    unsafe {
        let wnd_class = WNDCLASSW {
            lpfnWndProc: Some(tray_wnd_proc),
            hInstance: instance,
            lpszClassName: w!("TrayDownloaderWindow"),
            ..Default::default()
        };

        if RegisterClassW(&wnd_class) == 0 {
            match GetLastError() {
                Err(err) if err.code() == CLASS_ALREADY_EXISTS_ERR.to_hresult() => {}
                _ => return Err(WindowError::ClassRegistrationFailed),
            }
        }
    }

    Ok(())
}

unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CREATE => {
            let createstruct = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, createstruct.lpCreateParams as isize);
            LRESULT(0)
        }
        WM_HOTKEY => {
            if let Some(state) = window_state_mut(hwnd) {
                let id = wparam.0 as i32;
                match state.hotkeys.as_ref().and_then(|hotkeys| hotkeys.command_for(id)) {
                    Some(command) => state.dispatch(command),
                    None => tracing::debug!(id, "ignoring unknown hotkey"),
                }
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            let id = (wparam.0 & 0xFFFF) as u16;
            if let Some(command) = Command::from_menu_id(id) {
                if let Some(state) = window_state_mut(hwnd) {
                    state.dispatch(command);
                }
            }
            LRESULT(0)
        }
        WM_TRAY => {
            match (lparam.0 as u32) & 0xFFFF {
                WM_RBUTTONUP => {
                    if let Err(err) = show_tray_menu(hwnd) {
                        tracing::error!("{err}");
                    }
                }
                WM_LBUTTONDBLCLK => {
                    if let Some(state) = window_state_mut(hwnd) {
                        state.dispatch(Command::OpenList);
                    }
                }
                _ => {}
            }
            LRESULT(0)
        }
        WM_TIMER if wparam.0 == STATUS_TIMER_ID => {
            let _ = KillTimer(hwnd, STATUS_TIMER_ID);
            if let Some(state) = window_state_mut(hwnd) {
                let effects = state.controller.on_status_timer();
                state.apply(effects);
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            let _ = KillTimer(hwnd, STATUS_TIMER_ID);
            if let Some(state) = window_state_mut(hwnd) {
                state.shutdown();
            }
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => {
            if let Some(state) = window_state_mut(hwnd) {
                if state.taskbar_created != 0 && msg == state.taskbar_created {
                    state.restore_tray();
                    return LRESULT(0);
                }
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
    }
}

unsafe fn window_state_mut(hwnd: HWND) -> Option<&'static mut WindowState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowState;
    if ptr.is_null() {
        None
    } else {
        Some(&mut *ptr)
    }
}

impl WindowState {
    /// Adds the tray icon and applies the controller's startup effects
    fn start(&mut self, hwnd: HWND) -> Result<(), WindowError> {
        self.hwnd = hwnd;
        self.taskbar_created = unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) };
        self.icon_size = match unsafe { GetSystemMetrics(SM_CXSMICON) } {
            size if size > 0 => size as u32,
            _ => DEFAULT_ICON_SIZE,
        };

        let queued = self.controller.queued();
        let pixmap = self
            .renderer
            .render(&IconLayout::new(self.icon_size, AppState::Idle, queued))?;
        self.tray = Some(TrayIcon::add(
            hwnd,
            TRAY_ICON_ID,
            WM_TRAY,
            &pixmap,
            &tooltip(queued),
        )?);
        self.hotkeys = Some(HotkeyRegistry::new(hwnd));

        tracing::info!(icon_size = self.icon_size, queued, "tray icon added");

        let effects = self.controller.startup_effects();
        self.apply(effects);

        if self.hotkeys.as_ref().is_none_or(HotkeyRegistry::is_empty) {
            tracing::warn!("no global hotkeys active, only the tray menu works");
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) {
        let effects = match self.controller.handle(command) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::error!(?command, "command failed: {err}");
                self.controller.error_effects(&err)
            }
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Status { state, queued } => self.show_status(state, queued),
                Effect::Notify { title, message } => self.balloon(&title, &message),
                Effect::Open(path) => {
                    if let Err(err) = open_path(&path) {
                        tracing::warn!("{err}");
                        self.balloon(APP_TITLE, &format!("Could not open {}", path.display()));
                    }
                }
                Effect::RebindHotkeys(bindings) => {
                    let failures = match self.hotkeys.as_mut() {
                        Some(hotkeys) => hotkeys.rebind(&bindings),
                        None => Vec::new(),
                    };
                    for err in failures {
                        tracing::warn!("{err}");
                        self.balloon(APP_TITLE, &err.to_string());
                    }
                }
                Effect::Quit => {
                    tracing::info!("exit requested");
                    // Closing through the queue keeps WM_DESTROY out of this call stack
                    let _ = unsafe { PostMessageW(self.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) };
                }
            }
        }
    }

    fn show_status(&mut self, state: AppState, queued: usize) {
        let layout = IconLayout::new(self.icon_size, state, queued);
        match self.renderer.render(&layout) {
            Ok(pixmap) => {
                if let Some(tray) = self.tray.as_mut() {
                    if let Err(err) = tray.update(&pixmap, &tooltip(queued)) {
                        tracing::warn!("failed to update tray icon: {err}");
                    }
                }
            }
            Err(err) => tracing::warn!("failed to render tray icon: {err}"),
        }

        unsafe {
            if state == AppState::Idle {
                let _ = KillTimer(self.hwnd, STATUS_TIMER_ID);
            } else {
                SetTimer(self.hwnd, STATUS_TIMER_ID, STATUS_FLASH_MS, None);
            }
        }
    }

    fn balloon(&self, title: &str, message: &str) {
        if !self.controller.config().notifications {
            tracing::debug!("balloon suppressed: {message}");
            return;
        }
        if let Some(tray) = self.tray.as_ref() {
            tray.notify(title, message);
        }
    }

    /// Explorer restarted and forgot the icon
    fn restore_tray(&mut self) {
        tracing::info!("taskbar recreated, adding tray icon again");
        if let Some(tray) = self.tray.as_mut() {
            if let Err(err) = tray.register() {
                tracing::warn!("failed to restore tray icon: {err}");
            }
        }
    }

    fn shutdown(&mut self) {
        // Hotkeys first so nothing new arrives while the icon goes away
        self.hotkeys = None;
        self.tray = None;
        self.hwnd = HWND(0);
    }
}
