//! Error types for playback control

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index out of bounds
    #[error("Index out of bounds: {index} (queue length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Track has no source for any quality tier
    #[error("No playable source for track {0}")]
    NoSource(String),

    /// Audio engine reported a failure
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// Player task is gone
    #[error("Player is not running")]
    PlayerClosed,
}

impl PlaybackError {
    pub(crate) fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
