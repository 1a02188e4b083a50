//! Keyboard shortcuts for the player
//!
//! # Example
//!
//! ```rust
//! use tunez_playback::keybinds::{Key, KeyInput, Shortcut, ShortcutAction};
//!
//! let input = KeyInput::parse("Shift+Right").unwrap();
//! assert_eq!(Shortcut::from_key(&input, false), Some(ShortcutAction::Next));
//!
//! // Space does nothing while a text field has focus
//! assert_eq!(Shortcut::from_key(&KeyInput::new(Key::Space), true), None);
//! ```

use serde::{Deserialize, Serialize};

/// Available shortcut actions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    /// Play or pause playback
    PlayPause,
    /// Skip to next track
    Next,
    /// Skip to previous track
    Previous,
    /// Increase volume by one step
    VolumeUp,
    /// Decrease volume by one step
    VolumeDown,
    /// Cycle loop mode
    CycleLoop,
    /// Toggle shuffle mode
    ToggleShuffle,
    /// Toggle mute
    ToggleMute,
}

impl ShortcutAction {
    /// Convert action to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::CycleLoop => "cycle_loop",
            Self::ToggleShuffle => "toggle_shuffle",
            Self::ToggleMute => "toggle_mute",
        }
    }

    /// Parse action from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "play_pause" => Some(Self::PlayPause),
            "next" => Some(Self::Next),
            "previous" => Some(Self::Previous),
            "volume_up" => Some(Self::VolumeUp),
            "volume_down" => Some(Self::VolumeDown),
            "cycle_loop" => Some(Self::CycleLoop),
            "toggle_shuffle" => Some(Self::ToggleShuffle),
            "toggle_mute" => Some(Self::ToggleMute),
            _ => None,
        }
    }
}

/// Physical key, without modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Printable character, lowercase
    Char(char),
}

/// A key press with its Shift state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }

    /// Parse an accelerator such as `"Space"`, `"n"` or `"Shift+Up"`
    pub fn parse(accelerator: &str) -> Option<Self> {
        let accelerator = accelerator.trim();
        let (shift, name) = match accelerator.split_once('+') {
            Some((modifier, name)) if modifier.eq_ignore_ascii_case("shift") => (true, name),
            Some(_) => return None,
            None => (false, accelerator),
        };

        let key = match name.to_ascii_lowercase().as_str() {
            "space" => Key::Space,
            "up" | "arrowup" => Key::ArrowUp,
            "down" | "arrowdown" => Key::ArrowDown,
            "left" | "arrowleft" => Key::ArrowLeft,
            "right" | "arrowright" => Key::ArrowRight,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };

        Some(Self { key, shift })
    }
}

/// A default key binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    /// Action triggered by this shortcut
    pub action: ShortcutAction,
    /// Accelerator text, as accepted by [`KeyInput::parse`]
    pub accelerator: &'static str,
}

/// Built-in bindings, in display order
pub const DEFAULT_SHORTCUTS: &[Shortcut] = &[
    Shortcut { action: ShortcutAction::PlayPause, accelerator: "Space" },
    Shortcut { action: ShortcutAction::Next, accelerator: "n" },
    Shortcut { action: ShortcutAction::Next, accelerator: "Shift+Right" },
    Shortcut { action: ShortcutAction::Previous, accelerator: "p" },
    Shortcut { action: ShortcutAction::Previous, accelerator: "Shift+Left" },
    Shortcut { action: ShortcutAction::VolumeUp, accelerator: "Shift+Up" },
    Shortcut { action: ShortcutAction::VolumeDown, accelerator: "Shift+Down" },
    Shortcut { action: ShortcutAction::CycleLoop, accelerator: "l" },
    Shortcut { action: ShortcutAction::ToggleShuffle, accelerator: "s" },
    Shortcut { action: ShortcutAction::ToggleMute, accelerator: "m" },
];

impl Shortcut {
    /// Action bound to a key press
    ///
    /// Space is ignored while `typing` so it can reach the text field.
    pub fn from_key(input: &KeyInput, typing: bool) -> Option<ShortcutAction> {
        match (input.key, input.shift) {
            (Key::Space, _) if typing => None,
            (Key::Space, _) => Some(ShortcutAction::PlayPause),
            (Key::ArrowRight, true) => Some(ShortcutAction::Next),
            (Key::ArrowLeft, true) => Some(ShortcutAction::Previous),
            (Key::ArrowUp, true) => Some(ShortcutAction::VolumeUp),
            (Key::ArrowDown, true) => Some(ShortcutAction::VolumeDown),
            (Key::Char(c), false) => match c {
                'n' => Some(ShortcutAction::Next),
                'p' => Some(ShortcutAction::Previous),
                'l' => Some(ShortcutAction::CycleLoop),
                's' => Some(ShortcutAction::ToggleShuffle),
                'm' => Some(ShortcutAction::ToggleMute),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Volume after one step up or down
///
/// Steps from the engine's reported level. If the engine reports none the
/// last non-zero level is used unchanged.
pub fn stepped_volume(engine_volume: Option<f32>, last_non_zero: f32, delta: f32) -> f32 {
    match engine_volume {
        Some(current) => (current + delta).clamp(0.0, 1.0),
        None => last_non_zero,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_string_roundtrip() {
        for shortcut in DEFAULT_SHORTCUTS {
            let action = shortcut.action;
            assert_eq!(ShortcutAction::from_str(action.as_str()), Some(action));
        }
        assert_eq!(ShortcutAction::from_str("rewind"), None);
    }

    #[test]
    fn default_table_matches_from_key() {
        for shortcut in DEFAULT_SHORTCUTS {
            let input = KeyInput::parse(shortcut.accelerator).unwrap();
            assert_eq!(
                Shortcut::from_key(&input, false),
                Some(shortcut.action),
                "{}",
                shortcut.accelerator
            );
        }
    }

    #[test]
    fn arrows_need_shift() {
        assert_eq!(Shortcut::from_key(&KeyInput::new(Key::ArrowRight), false), None);
        assert_eq!(Shortcut::from_key(&KeyInput::new(Key::ArrowUp), false), None);
        assert_eq!(
            Shortcut::from_key(&KeyInput::shifted(Key::ArrowDown), false),
            Some(ShortcutAction::VolumeDown)
        );
    }

    #[test]
    fn typing_only_suppresses_space() {
        assert_eq!(Shortcut::from_key(&KeyInput::new(Key::Space), true), None);
        assert_eq!(
            Shortcut::from_key(&KeyInput::new(Key::Char('n')), true),
            Some(ShortcutAction::Next)
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(KeyInput::parse("Ctrl+n"), None);
        assert_eq!(KeyInput::parse("F12"), None);
        assert_eq!(KeyInput::parse("Shift+up"), Some(KeyInput::shifted(Key::ArrowUp)));
        assert_eq!(KeyInput::parse("N"), Some(KeyInput::new(Key::Char('n'))));
    }

    #[test]
    fn volume_steps_clamp() {
        assert!((stepped_volume(Some(0.5), 0.7, 0.05) - 0.55).abs() < 1e-6);
        assert_eq!(stepped_volume(Some(0.98), 0.7, 0.05), 1.0);
        assert_eq!(stepped_volume(Some(0.02), 0.7, -0.05), 0.0);
        assert_eq!(stepped_volume(None, 0.7, 0.05), 0.7);
    }
}
