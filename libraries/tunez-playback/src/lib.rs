//! Tunez Playback
//!
//! Platform-agnostic playback session control for Tunez.
//!
//! This crate provides:
//! - Next/previous/track-end index selection (shuffle, loop playlist, loop track)
//! - Queue edits that keep the current index in bounds
//! - Volume with mute memory and a bounded volume reconciliation loop
//! - Seek bars and per-frame position polling per UI surface
//! - Keyboard shortcuts
//! - An async driver that owns the controller and its timers
//!
//! # Architecture
//!
//! `tunez-playback` never touches audio data:
//! - Audio output is an [`AudioEngine`] implemented by the host
//! - Durable preferences and session flags come from `tunez-storage`
//! - Source URLs come from a `tunez_core::SourceResolver`
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use std::sync::Arc;
//! # use tunez_playback::{AudioEngine, LoadOptions};
//! use tunez_core::{StreamQuality, Track};
//! use tunez_playback::{PlaybackConfig, PlaybackController, PlaybackState};
//! use tunez_storage::{PreferenceStore, SessionState};
//!
//! # #[derive(Default)]
//! # struct NullEngine { loaded: bool, playing: bool }
//! # impl AudioEngine for NullEngine {
//! #     fn load(&mut self, _url: &str, opts: LoadOptions) { self.loaded = true; self.playing = opts.autoplay; }
//! #     fn play(&mut self) { self.playing = self.loaded; }
//! #     fn pause(&mut self) { self.playing = false; }
//! #     fn seek(&mut self, _seconds: f64) {}
//! #     fn position(&self) -> f64 { 0.0 }
//! #     fn duration(&self) -> f64 { 180.0 }
//! #     fn volume(&self) -> Option<f32> { None }
//! #     fn set_volume(&mut self, _level: f32) {}
//! #     fn set_muted(&mut self, _muted: bool) {}
//! #     fn is_muted(&self) -> bool { false }
//! #     fn set_looping(&mut self, _looping: bool) {}
//! #     fn is_looping(&self) -> bool { false }
//! #     fn is_loading(&self) -> bool { false }
//! #     fn is_ready(&self) -> bool { self.loaded }
//! #     fn is_playing(&self) -> bool { self.playing }
//! # }
//! let mut controller = PlaybackController::new(
//!     NullEngine::default(),
//!     Arc::new(PreferenceStore::in_memory()),
//!     Arc::new(SessionState::new()),
//!     PlaybackConfig::default(),
//! );
//!
//! let tracks: Vec<Track> = ["a", "b", "c"]
//!     .iter()
//!     .map(|id| {
//!         let mut track = Track::new(*id, id.to_uppercase());
//!         track
//!             .download_url
//!             .insert(StreamQuality::High, format!("https://cdn.example/{id}.mp4"));
//!         track
//!     })
//!     .collect();
//!
//! // Picking a track arms the player and loads it with autoplay
//! controller.replace_queue(tracks, 2);
//! assert_eq!(controller.state(), PlaybackState::Playing);
//!
//! // End of queue without looping: skipping forward stays put
//! controller.skip_next();
//! assert_eq!(controller.current_index(), 2);
//!
//! controller.toggle_loop_playlist();
//! controller.skip_next();
//! assert_eq!(controller.current_index(), 0);
//! ```

mod controller;
pub mod driver;
mod error;
mod events;
pub mod keybinds;
mod position;
mod queue;
mod reconcile;
mod selection;
mod shuffle;
mod source;
pub mod types;
mod volume;

// Public exports
pub use controller::{
    PlaybackController, PlayerStatus, NOTICE_LOOP_OFF, NOTICE_LOOP_PLAYLIST, NOTICE_LOOP_TRACK,
};
pub use driver::{spawn_player, PlayerCommand, PlayerHandle};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use keybinds::{Key, KeyInput, Shortcut, ShortcutAction};
pub use position::{PositionTracker, SeekBar};
pub use queue::{clamp_index, index_after_move, index_after_removal};
pub use reconcile::{ReconcileStep, VolumeReconciler};
pub use selection::{IndexChoice, IndexSelector};
pub use shuffle::ShufflePicker;
pub use source::{AudioEngine, EngineEvent, EngineEventKind, LoadOptions};
pub use types::{
    EngineStatus, LoopMode, PlaybackConfig, PlaybackMode, PlaybackState, Surface, VolumeState,
};
pub use volume::VolumeControl;
