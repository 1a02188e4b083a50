//! Ephemeral session state
//!
//! Flags and values that live for one run of the player and are never
//! persisted. Each is an observable [`StateCell`].

use crate::cell::StateCell;

/// Process-lifetime player state shared between the controller and its surfaces
#[derive(Debug, Default)]
pub struct SessionState {
    /// Set by the first user gesture; no source is loaded before it
    pub player_init: StateCell<bool>,

    /// Pick the next track at random on track end
    pub shuffle: StateCell<bool>,

    /// Wrap to the start of the queue after the last track
    pub loop_playlist: StateCell<bool>,

    /// Repeat the current track (engine-level loop)
    pub loop_track: StateCell<bool>,

    /// A text input has focus; the Space shortcut is suppressed
    pub typing: StateCell<bool>,

    /// Full-screen now-playing view is open
    pub now_playing_open: StateCell<bool>,

    /// Last published playback position in seconds
    pub current_time: StateCell<f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
