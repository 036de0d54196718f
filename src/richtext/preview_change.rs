// Preview Changes
// Tags announced to the host before a mutation commits, plus the keyboard shortcut flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Highest code a host extension may use; extensions count down from here
pub const CUSTOM_PREVIEW_CHANGE_START: i64 = 9999;

/// Codes up to this value belong to the built-in change kinds
pub const RESERVED_PREVIEW_CHANGE_END: i64 = 8999;

/// Kind of change about to be applied to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewChange {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    FontResize,
    Highlight,
    FontSize,
    FontColor,
    IndentIncrease,
    IndentDecrease,
    Cut,
    Paste,
    Space,
    Enter,
    BulletedList,
    OrderedList,
    HyperLink,
    MouseDown,
    MouseDragged,
    ArrowKey,
    KeyDown,
    Delete,
    FindReplace,
    /// Host-defined kind, coded from 9999 downwards
    Custom(i64),
}

const BUILT_IN: [PreviewChange; 23] = [
    PreviewChange::Bold,
    PreviewChange::Italic,
    PreviewChange::Underline,
    PreviewChange::Strikethrough,
    PreviewChange::FontResize,
    PreviewChange::Highlight,
    PreviewChange::FontSize,
    PreviewChange::FontColor,
    PreviewChange::IndentIncrease,
    PreviewChange::IndentDecrease,
    PreviewChange::Cut,
    PreviewChange::Paste,
    PreviewChange::Space,
    PreviewChange::Enter,
    PreviewChange::BulletedList,
    PreviewChange::OrderedList,
    PreviewChange::HyperLink,
    PreviewChange::MouseDown,
    PreviewChange::MouseDragged,
    PreviewChange::ArrowKey,
    PreviewChange::KeyDown,
    PreviewChange::Delete,
    PreviewChange::FindReplace,
];

impl PreviewChange {
    /// Numeric code shared with hosts
    pub fn code(self) -> i64 {
        match self {
            PreviewChange::Custom(code) => code,
            built_in => BUILT_IN
                .iter()
                .position(|c| *c == built_in)
                .map(|p| p as i64)
                .unwrap_or(-1),
        }
    }

    /// Built-in kind for codes 0..=22; anything above the reserved block is custom
    pub fn from_code(code: i64) -> Option<PreviewChange> {
        if (0..BUILT_IN.len() as i64).contains(&code) {
            return Some(BUILT_IN[code as usize]);
        }
        (code > RESERVED_PREVIEW_CHANGE_END && code <= CUSTOM_PREVIEW_CHANGE_START)
            .then_some(PreviewChange::Custom(code))
    }

    /// Kinds that only move the caret or forward raw input
    pub fn is_special(self) -> bool {
        !matches!(
            self,
            PreviewChange::MouseDown
                | PreviewChange::MouseDragged
                | PreviewChange::ArrowKey
                | PreviewChange::KeyDown
        )
    }

    /// Human-readable name. Non-special kinds yield `None` unless
    /// `with_non_special_text` is set; custom kinds always yield `None` here.
    pub fn to_display_string(self, with_non_special_text: bool) -> Option<&'static str> {
        if !self.is_special() && !with_non_special_text {
            return None;
        }
        let name = match self {
            PreviewChange::Bold => "Bold",
            PreviewChange::Italic => "Italic",
            PreviewChange::Underline => "Underline",
            PreviewChange::Strikethrough => "Strikethrough",
            PreviewChange::FontResize => "Font Resize",
            PreviewChange::Highlight => "Highlight",
            PreviewChange::FontSize => "Font Size",
            PreviewChange::FontColor => "Font Color",
            PreviewChange::IndentIncrease => "Increase Indent",
            PreviewChange::IndentDecrease => "Decrease Indent",
            PreviewChange::Cut => "Cut",
            PreviewChange::Paste => "Paste",
            PreviewChange::Space => "Space",
            PreviewChange::Enter => "Enter",
            PreviewChange::BulletedList => "Bulleted List",
            PreviewChange::OrderedList => "Ordered List",
            PreviewChange::HyperLink => "Hyperlink",
            PreviewChange::MouseDown => "Mouse Down",
            PreviewChange::MouseDragged => "Mouse Dragged",
            PreviewChange::ArrowKey => "Arrow Key",
            PreviewChange::KeyDown => "Key Down",
            PreviewChange::Delete => "Delete",
            PreviewChange::FindReplace => "Find & Replace",
            PreviewChange::Custom(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for PreviewChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_display_string(true) {
            Some(name) => f.write_str(name),
            None => write!(f, "Custom({})", self.code()),
        }
    }
}

/// Names for host-defined preview changes. Hosts extending the kinds override
/// `custom_name`; built-in kinds always use their own names.
pub trait PreviewChangeNames {
    fn custom_name(&self, _code: i64, _with_non_special_text: bool) -> Option<String> {
        None
    }

    fn preview_change_name(
        &self,
        change: PreviewChange,
        with_non_special_text: bool,
    ) -> Option<String> {
        match change {
            PreviewChange::Custom(code) => self.custom_name(code, with_non_special_text),
            built_in => built_in
                .to_display_string(with_non_special_text)
                .map(str::to_string),
        }
    }
}

/// Built-in names only
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreviewChangeNames;

impl PreviewChangeNames for DefaultPreviewChangeNames {}

/// Set of keyboard shortcuts the host enables. The empty set means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shortcuts(pub u16);

impl Shortcuts {
    pub const ALL: Shortcuts = Shortcuts(0);
    pub const BOLD: Shortcuts = Shortcuts(1 << 0);
    pub const ITALIC: Shortcuts = Shortcuts(1 << 1);
    pub const UNDERLINE: Shortcuts = Shortcuts(1 << 2);
    pub const STRIKETHROUGH: Shortcuts = Shortcuts(1 << 3);
    pub const INCREASE_FONT_SIZE: Shortcuts = Shortcuts(1 << 4);
    pub const DECREASE_FONT_SIZE: Shortcuts = Shortcuts(1 << 5);
    pub const BULLETED_LIST: Shortcuts = Shortcuts(1 << 6);
    pub const ORDERED_LIST: Shortcuts = Shortcuts(1 << 7);
    pub const LEAVE_BULLETED_LIST: Shortcuts = Shortcuts(1 << 8);
    pub const DECREASE_INDENT: Shortcuts = Shortcuts(1 << 9);
    pub const INCREASE_INDENT: Shortcuts = Shortcuts(1 << 10);

    /// Whether `shortcut` is enabled; the empty set enables everything
    pub fn contains(self, shortcut: Shortcuts) -> bool {
        self.0 == 0 || self.0 & shortcut.0 == shortcut.0
    }

    pub fn insert(&mut self, shortcut: Shortcuts) {
        self.0 |= shortcut.0;
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for Shortcuts {
    type Output = Shortcuts;

    fn bitor(self, rhs: Self) -> Self::Output {
        Shortcuts(self.0 | rhs.0)
    }
}

impl BitOrAssign for Shortcuts {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HostNames;

    impl PreviewChangeNames for HostNames {
        fn custom_name(&self, code: i64, _with_non_special_text: bool) -> Option<String> {
            (code == 9999).then(|| "Comment".to_string())
        }
    }

    #[test]
    fn test_codes_follow_declaration_order() {
        assert_eq!(PreviewChange::Bold.code(), 0);
        assert_eq!(PreviewChange::HyperLink.code(), 16);
        assert_eq!(PreviewChange::FindReplace.code(), 22);
        for code in 0..23 {
            assert_eq!(PreviewChange::from_code(code).unwrap().code(), code);
        }
        assert_eq!(PreviewChange::from_code(23), None);
        assert_eq!(
            PreviewChange::from_code(9998),
            Some(PreviewChange::Custom(9998))
        );
        assert_eq!(PreviewChange::from_code(10000), None);
    }

    #[test]
    fn test_non_special_names_are_optional() {
        assert_eq!(PreviewChange::ArrowKey.to_display_string(false), None);
        assert_eq!(
            PreviewChange::ArrowKey.to_display_string(true),
            Some("Arrow Key")
        );
        assert_eq!(PreviewChange::Bold.to_display_string(false), Some("Bold"));
        assert_eq!(PreviewChange::Custom(9999).to_string(), "Custom(9999)");
    }

    #[test]
    fn test_custom_names_come_from_the_host() {
        assert_eq!(
            HostNames.preview_change_name(PreviewChange::Custom(9999), false),
            Some("Comment".to_string())
        );
        assert_eq!(
            HostNames.preview_change_name(PreviewChange::Paste, false),
            Some("Paste".to_string())
        );
        assert_eq!(
            DefaultPreviewChangeNames.preview_change_name(PreviewChange::Custom(9999), true),
            None
        );
    }

    #[test]
    fn test_shortcut_flags() {
        assert!(Shortcuts::ALL.contains(Shortcuts::BOLD));
        let mut enabled = Shortcuts::BOLD | Shortcuts::ITALIC;
        assert!(enabled.contains(Shortcuts::ITALIC));
        assert!(!enabled.contains(Shortcuts::UNDERLINE));
        enabled |= Shortcuts::INCREASE_INDENT;
        assert_eq!(enabled.bits(), 0b100_0000_0011);
    }
}
