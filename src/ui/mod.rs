//! User interface rendering
//!
//! The tray icon is the only visual surface; it is drawn here and handed to
//! the platform layer as a pixmap.

pub mod icon;

pub use icon::IconRenderer;
