//! Platform-agnostic audio engine trait
//!
//! The controller never decodes or streams audio itself. A host wraps one
//! playback primitive (an HTML audio element, a native player, a simulator)
//! in [`AudioEngine`] and reports asynchronous completions as [`EngineEvent`]s.

use serde::{Deserialize, Serialize};

/// Options passed with every [`AudioEngine::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Start playing as soon as the source is buffered
    pub autoplay: bool,

    /// Start muted
    pub initial_mute: bool,

    /// Tag the engine must copy into every event for this source
    pub generation: u64,
}

/// Asynchronous notification from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Generation of the load this event belongs to
    pub generation: u64,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn loaded(generation: u64) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Loaded,
        }
    }

    pub fn ended(generation: u64) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Ended,
        }
    }

    pub fn failed(generation: u64, message: impl Into<String>) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Failed(message.into()),
        }
    }
}

/// What happened to a loaded source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Source is buffered and accepts commands reliably
    Loaded,

    /// Natural end of the source (never on pause, seek or replacement)
    Ended,

    /// Network or decoding failure
    Failed(String),
}

/// Single-source audio playback primitive
///
/// Exactly one source is active at a time; `load` replaces it. Transport
/// commands are idempotent and do nothing while no source is loaded.
///
/// Volume calls made before the engine is ready may be silently dropped.
/// Callers that need a level to stick re-apply it (see
/// [`VolumeReconciler`](crate::VolumeReconciler)).
pub trait AudioEngine: Send {
    /// Begin buffering `url`, replacing any current source
    ///
    /// Completion is reported as [`EngineEventKind::Loaded`] or
    /// [`EngineEventKind::Failed`] tagged with `options.generation`.
    fn load(&mut self, url: &str, options: LoadOptions);

    fn play(&mut self);

    fn pause(&mut self);

    fn toggle_play_pause(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to `seconds` from the start of the source
    fn seek(&mut self, seconds: f64);

    /// Current position in seconds; non-decreasing except across seeks
    fn position(&self) -> f64;

    /// Source length in seconds, 0 while unknown
    fn duration(&self) -> f64;

    /// Reported output level, `None` while the engine cannot report one
    fn volume(&self) -> Option<f32>;

    fn set_volume(&mut self, level: f32);

    fn set_muted(&mut self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Native single-source repeat
    fn set_looping(&mut self, looping: bool);

    fn is_looping(&self) -> bool;

    fn is_loading(&self) -> bool;

    fn is_ready(&self) -> bool;

    fn is_playing(&self) -> bool;
}
