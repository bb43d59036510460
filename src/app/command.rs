//! User commands and their tray menu / hotkey identifiers

/// Hotkey id for add-from-clipboard
pub const HOTKEY_ADD_ID: i32 = 1;
/// Hotkey id for download-all
pub const HOTKEY_DOWNLOAD_ID: i32 = 2;

/// Everything the user can ask the tray app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    AddFromClipboard,
    DownloadAll,
    OpenList,
    OpenDownloads,
    OpenSettings,
    ReloadSettings,
    ShowInfo,
    Exit,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::AddFromClipboard,
        Command::DownloadAll,
        Command::OpenList,
        Command::OpenDownloads,
        Command::OpenSettings,
        Command::ReloadSettings,
        Command::ShowInfo,
        Command::Exit,
    ];

    /// Stable `WM_COMMAND` id of the menu item
    pub fn menu_id(self) -> u16 {
        match self {
            Command::DownloadAll => 200,
            Command::OpenList => 201,
            Command::OpenDownloads => 202,
            Command::OpenSettings => 203,
            Command::ShowInfo => 204,
            Command::Exit => 205,
            Command::ReloadSettings => 206,
            Command::AddFromClipboard => 207,
        }
    }

    pub fn from_menu_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.menu_id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::AddFromClipboard => "Add link from clipboard",
            Command::DownloadAll => "Download",
            Command::OpenList => "Download list",
            Command::OpenDownloads => "Open downloads folder",
            Command::OpenSettings => "Settings",
            Command::ReloadSettings => "Reload settings",
            Command::ShowInfo => "Info",
            Command::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Item(Command),
    Separator,
}

/// Tray context menu, top to bottom
pub fn tray_menu() -> Vec<MenuEntry> {
    use MenuEntry::{Item, Separator};
    vec![
        Item(Command::DownloadAll),
        Item(Command::AddFromClipboard),
        Separator,
        Item(Command::OpenList),
        Item(Command::OpenDownloads),
        Separator,
        Item(Command::OpenSettings),
        Item(Command::ReloadSettings),
        Item(Command::ShowInfo),
        Separator,
        Item(Command::Exit),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn menu_ids_round_trip_and_are_unique() {
        let ids: HashSet<u16> = Command::ALL.iter().map(|c| c.menu_id()).collect();
        assert_eq!(ids.len(), Command::ALL.len());

        for command in Command::ALL {
            assert_eq!(Command::from_menu_id(command.menu_id()), Some(command));
        }
        assert_eq!(Command::from_menu_id(0), None);
    }

    #[test]
    fn menu_and_hotkey_ids_are_stable() {
        let expected = [
            (Command::DownloadAll, 200),
            (Command::OpenList, 201),
            (Command::OpenDownloads, 202),
            (Command::OpenSettings, 203),
            (Command::ShowInfo, 204),
            (Command::Exit, 205),
            (Command::ReloadSettings, 206),
            (Command::AddFromClipboard, 207),
        ];
        for (command, id) in expected {
            assert_eq!(command.menu_id(), id, "{command:?}");
            assert_eq!(Command::from_menu_id(id), Some(command));
        }

        assert_eq!(HOTKEY_ADD_ID, 1);
        assert_eq!(HOTKEY_DOWNLOAD_ID, 2);
    }

    #[test]
    fn menu_lists_every_command_once() {
        let items: Vec<Command> = tray_menu()
            .into_iter()
            .filter_map(|entry| match entry {
                MenuEntry::Item(command) => Some(command),
                MenuEntry::Separator => None,
            })
            .collect();

        assert_eq!(items.len(), Command::ALL.len());
        assert_eq!(items.first(), Some(&Command::DownloadAll));
        assert_eq!(items.last(), Some(&Command::Exit));
    }
}
