//! Hotkey descriptions for global shortcut registration
//!
//! Hotkeys are written in the config file as `+`-separated tokens such as
//! `ctrl+shift+space`. This module turns them into modifier masks and
//! virtual-key codes. It's completely pure and testable without Win32.

use std::fmt;

/// Modifier keys for hotkey combinations (Win32 `MOD_*` bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HotkeyModifier {
    Alt = 1,
    Control = 2,
    Shift = 4,
    Windows = 8,
}

impl HotkeyModifier {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Self::Control),
            "shift" => Some(Self::Shift),
            "alt" => Some(Self::Alt),
            "win" | "windows" | "super" => Some(Self::Windows),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Control => "Ctrl",
            Self::Shift => "Shift",
            Self::Alt => "Alt",
            Self::Windows => "Win",
        }
    }
}

/// Keys that can complete a hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Up,
    Right,
    Down,
    Pause,
    PrintScreen,
    /// Uppercase ASCII letter
    Letter(char),
    /// Digit 0-9 on the main row
    Digit(u8),
    /// F1-F24
    Function(u8),
}

impl VirtualKey {
    /// Win32 virtual-key code
    pub fn code(self) -> u32 {
        match self {
            Self::Space => 0x20,
            Self::Enter => 0x0D,
            Self::Tab => 0x09,
            Self::Escape => 0x1B,
            Self::Backspace => 0x08,
            Self::Insert => 0x2D,
            Self::Delete => 0x2E,
            Self::Home => 0x24,
            Self::End => 0x23,
            Self::PageUp => 0x21,
            Self::PageDown => 0x22,
            Self::Left => 0x25,
            Self::Up => 0x26,
            Self::Right => 0x27,
            Self::Down => 0x28,
            Self::Pause => 0x13,
            Self::PrintScreen => 0x2C,
            Self::Letter(ch) => ch as u32,
            Self::Digit(d) => 0x30 + d as u32,
            Self::Function(n) => 0x70 + (n as u32 - 1),
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        let key = match token {
            "space" => Self::Space,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "esc" | "escape" => Self::Escape,
            "backspace" => Self::Backspace,
            "ins" | "insert" => Self::Insert,
            "del" | "delete" => Self::Delete,
            "home" => Self::Home,
            "end" => Self::End,
            "pgup" | "pageup" | "page_up" => Self::PageUp,
            "pgdn" | "pagedown" | "page_down" => Self::PageDown,
            "left" => Self::Left,
            "up" => Self::Up,
            "right" => Self::Right,
            "down" => Self::Down,
            "pause" => Self::Pause,
            "printscreen" | "print_screen" | "prtsc" => Self::PrintScreen,
            _ => return Self::from_short_token(token),
        };
        Some(key)
    }

    fn from_short_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        let first = chars.next()?;
        let rest = chars.as_str();

        if rest.is_empty() {
            if first.is_ascii_alphabetic() {
                return Some(Self::Letter(first.to_ascii_uppercase()));
            }
            if let Some(d) = first.to_digit(10) {
                return Some(Self::Digit(d as u8));
            }
            return None;
        }

        if first == 'f' {
            if let Ok(n) = rest.parse::<u8>() {
                if (1..=24).contains(&n) {
                    return Some(Self::Function(n));
                }
            }
        }

        None
    }
}

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(ch) => write!(f, "{ch}"),
            Self::Digit(d) => write!(f, "{d}"),
            Self::Function(n) => write!(f, "F{n}"),
            other => {
                let name = match other {
                    Self::Space => "Space",
                    Self::Enter => "Enter",
                    Self::Tab => "Tab",
                    Self::Escape => "Esc",
                    Self::Backspace => "Backspace",
                    Self::Insert => "Insert",
                    Self::Delete => "Delete",
                    Self::Home => "Home",
                    Self::End => "End",
                    Self::PageUp => "PageUp",
                    Self::PageDown => "PageDown",
                    Self::Left => "Left",
                    Self::Up => "Up",
                    Self::Right => "Right",
                    Self::Down => "Down",
                    Self::Pause => "Pause",
                    _ => "PrintScreen",
                };
                f.write_str(name)
            }
        }
    }
}

/// Hotkey parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyParseError {
    #[error("hotkey is empty")]
    Empty,

    #[error("unknown key '{0}'")]
    UnknownToken(String),

    #[error("hotkey '{0}' has no key, only modifiers")]
    MissingKey(String),

    #[error("hotkey '{0}' names more than one key")]
    MultipleKeys(String),

    #[error("hotkey '{0}' needs at least one modifier (ctrl, shift, alt, win)")]
    MissingModifier(String),

    #[error("modifier repeated in hotkey '{0}'")]
    RepeatedModifier(String),

    #[error("add and download hotkeys are both {0}")]
    Conflict(Hotkey),
}

/// A modifier set plus one key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    modifiers: Vec<HotkeyModifier>,
    key: VirtualKey,
}

impl Hotkey {
    /// Builds a hotkey from parts; modifiers are kept sorted
    pub fn new(modifiers: &[HotkeyModifier], key: VirtualKey) -> Self {
        let mut modifiers = modifiers.to_vec();
        modifiers.sort();
        modifiers.dedup();
        Self { modifiers, key }
    }

    /// Parses a config string such as `ctrl+shift+space`
    ///
    /// Tokens are case insensitive and may be padded with whitespace.
    pub fn parse(text: &str) -> Result<Self, HotkeyParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        let mut modifiers = Vec::new();
        let mut key = None;

        for raw in trimmed.split('+') {
            let token = raw.trim().to_ascii_lowercase();
            if token.is_empty() {
                return Err(HotkeyParseError::UnknownToken(raw.to_string()));
            }

            if let Some(modifier) = HotkeyModifier::from_token(&token) {
                if modifiers.contains(&modifier) {
                    return Err(HotkeyParseError::RepeatedModifier(trimmed.to_string()));
                }
                modifiers.push(modifier);
                continue;
            }

            let parsed = VirtualKey::from_token(&token)
                .ok_or_else(|| HotkeyParseError::UnknownToken(raw.trim().to_string()))?;
            if key.replace(parsed).is_some() {
                return Err(HotkeyParseError::MultipleKeys(trimmed.to_string()));
            }
        }

        let key = key.ok_or_else(|| HotkeyParseError::MissingKey(trimmed.to_string()))?;
        if modifiers.is_empty() {
            return Err(HotkeyParseError::MissingModifier(trimmed.to_string()));
        }

        Ok(Self::new(&modifiers, key))
    }

    pub fn key(&self) -> VirtualKey {
        self.key
    }

    /// Combined `MOD_*` mask for `RegisterHotKey`
    pub fn modifier_mask(&self) -> u32 {
        self.modifiers
            .iter()
            .fold(0u32, |acc, &modifier| acc | modifier as u32)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ctrl, Shift, Alt, Win is the order Windows itself shows
        const ORDER: [HotkeyModifier; 4] = [
            HotkeyModifier::Control,
            HotkeyModifier::Shift,
            HotkeyModifier::Alt,
            HotkeyModifier::Windows,
        ];
        for modifier in ORDER.iter().filter(|m| self.modifiers.contains(m)) {
            write!(f, "{}+", modifier.label())?;
        }
        write!(f, "{}", self.key)
    }
}

/// The two application hotkeys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub add: Hotkey,
    pub download: Hotkey,
}

impl HotkeyBindings {
    pub fn parse(add: &str, download: &str) -> Result<Self, HotkeyParseError> {
        let add = Hotkey::parse(add)?;
        let download = Hotkey::parse(download)?;
        if add == download {
            return Err(HotkeyParseError::Conflict(add));
        }
        Ok(Self { add, download })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_bindings() {
        let bindings = HotkeyBindings::parse("ctrl+space", "ctrl+shift+space").unwrap();

        assert_eq!(bindings.add.key(), VirtualKey::Space);
        assert_eq!(bindings.add.modifier_mask(), 2);
        assert_eq!(bindings.download.modifier_mask(), 2 | 4);
        assert_eq!(bindings.download.to_string(), "Ctrl+Shift+Space");
    }

    #[test]
    fn tokens_are_case_insensitive_and_trimmed() {
        let hotkey = Hotkey::parse("  Alt + Win + f9 ").unwrap();

        assert_eq!(hotkey.key(), VirtualKey::Function(9));
        assert_eq!(hotkey.key().code(), 0x78);
        assert_eq!(hotkey.modifier_mask(), 1 | 8);
        assert_eq!(hotkey.to_string(), "Alt+Win+F9");
    }

    #[test]
    fn letters_and_digits_map_to_ascii_codes() {
        assert_eq!(Hotkey::parse("ctrl+d").unwrap().key().code(), 0x44);
        assert_eq!(Hotkey::parse("ctrl+7").unwrap().key().code(), 0x37);
        assert_eq!(Hotkey::parse("ctrl+f24").unwrap().key().code(), 0x87);
    }

    #[test]
    fn modifier_order_does_not_matter() {
        assert_eq!(
            Hotkey::parse("shift+ctrl+space").unwrap(),
            Hotkey::parse("ctrl+shift+space").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_hotkeys() {
        assert_eq!(Hotkey::parse("   "), Err(HotkeyParseError::Empty));
        assert!(matches!(
            Hotkey::parse("ctrl+banana"),
            Err(HotkeyParseError::UnknownToken(t)) if t == "banana"
        ));
        assert!(matches!(Hotkey::parse("ctrl+shift"), Err(HotkeyParseError::MissingKey(_))));
        assert!(matches!(Hotkey::parse("ctrl+a+b"), Err(HotkeyParseError::MultipleKeys(_))));
        assert!(matches!(Hotkey::parse("space"), Err(HotkeyParseError::MissingModifier(_))));
        assert!(matches!(
            Hotkey::parse("ctrl+control+x"),
            Err(HotkeyParseError::RepeatedModifier(_))
        ));
        assert!(matches!(Hotkey::parse("ctrl++x"), Err(HotkeyParseError::UnknownToken(_))));
        assert!(matches!(Hotkey::parse("ctrl+f25"), Err(HotkeyParseError::UnknownToken(_))));
    }

    #[test]
    fn identical_bindings_conflict() {
        let result = HotkeyBindings::parse("ctrl+space", "Control + Space");
        assert!(matches!(result, Err(HotkeyParseError::Conflict(_))));
    }
}
