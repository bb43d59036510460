//! Application orchestration layer
//!
//! Commands come in from the tray menu and hotkeys; the controller turns them
//! into effects for the platform layer.

pub mod command;
pub mod controller;
pub mod state;
