//! Application state management
//!
//! The tray icon briefly changes colour after a capture or a dispatch and
//! then settles back. The state machine below decides which look wins.

/// Tray status shown by the icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    /// Waiting for a hotkey or menu command
    #[default]
    Idle,
    /// A link was just taken from the clipboard
    Capturing,
    /// Queued links were just handed to the downloader
    Dispatching,
}

/// Possible state transition events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    CaptureStarted,
    DispatchStarted,
    /// The icon flash ran out
    StatusTimerElapsed,
}

/// State machine for application state transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes a state event and returns the new state
    pub fn process_event(current_state: AppState, event: StateEvent) -> AppState {
        match (current_state, event) {
            (_, StateEvent::StatusTimerElapsed) => AppState::Idle,
            (_, StateEvent::DispatchStarted) => AppState::Dispatching,

            // A capture during a dispatch flash keeps the dispatch look
            (AppState::Dispatching, StateEvent::CaptureStarted) => AppState::Dispatching,
            (_, StateEvent::CaptureStarted) => AppState::Capturing,
        }
    }
}
