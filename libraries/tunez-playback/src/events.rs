//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller queues
//! events as it changes state; hosts drain them after every command or
//! engine callback and forward them to whatever renders the player.

use serde::{Deserialize, Serialize};

use crate::types::{PlaybackMode, PlaybackState};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A new source started loading
    TrackChanged {
        /// Queue index of the new track
        index: usize,
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previously loaded track (if any)
        previous_track_id: Option<String>,
    },

    /// Player state changed (idle, loading, playing, paused)
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// Displayed level (0.0 while muted)
        level: f32,
        /// Whether audio is muted
        muted: bool,
    },

    /// Shuffle or loop flags changed
    ModeChanged {
        /// New flags
        mode: PlaybackMode,
    },

    /// Queue replaced, edited or reordered
    QueueChanged {
        /// New queue length
        length: usize,
        /// Current index after the edit
        current_index: usize,
    },

    /// Position update (per poll or after a seek)
    PositionUpdate {
        /// Current playback position in seconds
        position_secs: f64,
        /// Source length in seconds (0 while unknown)
        duration_secs: f64,
    },

    /// Short user-facing message ("Looping playlist")
    Notice {
        /// Message text
        message: String,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Stable name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrackChanged { .. } => "track_changed",
            Self::StateChanged { .. } => "state_changed",
            Self::VolumeChanged { .. } => "volume_changed",
            Self::ModeChanged { .. } => "mode_changed",
            Self::QueueChanged { .. } => "queue_changed",
            Self::PositionUpdate { .. } => "position_update",
            Self::Notice { .. } => "notice",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_variant_tag() {
        let event = PlaybackEvent::StateChanged {
            state: PlaybackState::Playing,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["StateChanged"]["state"], "Playing");
        assert_eq!(event.name(), "state_changed");
    }
}
