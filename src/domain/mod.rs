//! Domain layer: link list storage, link routing, downloader planning and
//! hotkey descriptions. Nothing here depends on Win32.

pub mod download;
pub mod hotkey;
pub mod link_kind;
pub mod link_list;
