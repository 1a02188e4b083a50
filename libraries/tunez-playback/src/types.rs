//! Core types for playback control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// High-level player state, derived from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded (player not armed, or queue empty)
    #[default]
    Idle,

    /// Source is buffering
    Loading,

    /// Currently playing
    Playing,

    /// Loaded but not playing (paused or finished)
    Paused,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which loop behaviour is active
///
/// Track and playlist looping are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Off,
    /// Wrap around at the ends of the queue
    Playlist,
    /// Repeat the current track
    Track,
}

impl LoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Playlist => "playlist",
            Self::Track => "track",
        }
    }
}

/// Shuffle and loop flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackMode {
    pub shuffle: bool,
    pub loop_playlist: bool,
    pub loop_track: bool,
}

impl PlaybackMode {
    pub fn loop_mode(&self) -> LoopMode {
        if self.loop_track {
            LoopMode::Track
        } else if self.loop_playlist {
            LoopMode::Playlist
        } else {
            LoopMode::Off
        }
    }

    /// Flags for a loop mode, keeping shuffle
    pub fn with_loop(self, mode: LoopMode) -> Self {
        Self {
            shuffle: self.shuffle,
            loop_playlist: mode == LoopMode::Playlist,
            loop_track: mode == LoopMode::Track,
        }
    }
}

/// Volume as the user sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeState {
    /// Requested level (0.0-1.0)
    pub level: f32,

    /// Mute flag, reset every session
    pub muted: bool,

    /// Level restored on unmute; persisted
    pub last_non_zero: f32,
}

/// Snapshot of what the audio engine reports
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineStatus {
    pub ready: bool,
    pub loading: bool,
    pub playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
}

/// Presentation surfaces that display playback position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Full desktop player bar
    PlayerBar,
    /// Compact mobile player
    MiniPlayer,
    /// Expanded mobile now-playing view
    NowPlayingOverlay,
    /// Quick control in the bottom navigation
    BottomNav,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerBar => "player_bar",
            Self::MiniPlayer => "mini_player",
            Self::NowPlayingOverlay => "now_playing_overlay",
            Self::BottomNav => "bottom_nav",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "player_bar" => Some(Self::PlayerBar),
            "mini_player" => Some(Self::MiniPlayer),
            "now_playing_overlay" => Some(Self::NowPlayingOverlay),
            "bottom_nav" => Some(Self::BottomNav),
            _ => None,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Volume reconciliation attempts per run (default: 8)
    pub reconcile_attempts: u32,

    /// Delay between reconciliation attempts in ms (default: 150)
    pub reconcile_interval_ms: u64,

    /// Engine volume counts as applied within this distance (default: 0.02)
    pub volume_tolerance: f32,

    /// Volume change per shortcut press (default: 0.05)
    pub volume_step: f32,

    /// Position polling period in ms, roughly one display frame (default: 16)
    pub position_poll_interval_ms: u64,

    /// Fixed seed for shuffle picks; random when unset
    pub shuffle_seed: Option<u64>,

    /// Capacity of the event broadcast channel (default: 256)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms.max(1))
    }

    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.position_poll_interval_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            reconcile_attempts: 8,
            reconcile_interval_ms: 150,
            volume_tolerance: 0.02,
            volume_step: 0.05,
            position_poll_interval_ms: 16,
            shuffle_seed: None,
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.reconcile_attempts, 8);
        assert_eq!(config.reconcile_interval(), Duration::from_millis(150));
        assert_eq!(config.position_poll_interval(), Duration::from_millis(16));
        assert!(config.shuffle_seed.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"reconcile_attempts": 3, "shuffle_seed": 7}"#).unwrap();
        assert_eq!(config.reconcile_attempts, 3);
        assert_eq!(config.shuffle_seed, Some(7));
        assert_eq!(config.volume_step, 0.05);
    }

    #[test]
    fn loop_mode_flags_are_exclusive() {
        let mode = PlaybackMode {
            shuffle: true,
            ..PlaybackMode::default()
        };

        let track = mode.with_loop(LoopMode::Track);
        assert!(track.loop_track && !track.loop_playlist && track.shuffle);
        assert_eq!(track.loop_mode(), LoopMode::Track);

        let playlist = track.with_loop(LoopMode::Playlist);
        assert!(!playlist.loop_track && playlist.loop_playlist);
        assert_eq!(playlist.with_loop(LoopMode::Off).loop_mode(), LoopMode::Off);
    }

    #[test]
    fn surface_names_roundtrip() {
        for surface in [
            Surface::PlayerBar,
            Surface::MiniPlayer,
            Surface::NowPlayingOverlay,
            Surface::BottomNav,
        ] {
            assert_eq!(Surface::from_str(surface.as_str()), Some(surface));
        }
        assert_eq!(Surface::from_str("sidebar"), None);
    }
}
