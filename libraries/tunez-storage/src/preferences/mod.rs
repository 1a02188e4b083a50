//! Durable player preferences
//!
//! Everything the player restores on the next start: the queue, the
//! position in it, the three quality tiers and the volume level. Each entry
//! is a [`PersistentCell`] stored under a fixed key as JSON.
//!
//! # Example
//!
//! ```rust
//! use tunez_core::{StreamQuality, Track};
//! use tunez_storage::PreferenceStore;
//!
//! let prefs = PreferenceStore::in_memory();
//! prefs.set_queue(vec![Track::new("a", "A"), Track::new("b", "B")], 5);
//!
//! // Index is clamped into the queue
//! assert_eq!(prefs.current_index.get(), 1);
//! assert_eq!(prefs.stream_quality.get(), StreamQuality::Excellent);
//! ```

use std::fmt;
use std::sync::Arc;

use tunez_core::{ImageQuality, StreamQuality, Track};

use crate::cell::PersistentCell;
use crate::kv::{KeyValueStore, MemoryStore};

// Preference key constants
/// Ordered queue of tracks (JSON array)
pub const KEY_QUEUE: &str = "queue";

/// Index of the current track within the queue
pub const KEY_CURRENT_INDEX: &str = "current_song_index";

/// Quality tier used for streaming
pub const KEY_STREAM_QUALITY: &str = "stream_quality";

/// Quality tier used for downloads
pub const KEY_DOWNLOAD_QUALITY: &str = "download_quality";

/// Artwork resolution tier
pub const KEY_IMAGE_QUALITY: &str = "image_quality";

/// Last non-zero volume level (0.0-1.0)
pub const KEY_VOLUME: &str = "tunez_volume";

/// Volume used when nothing valid is stored
pub const DEFAULT_VOLUME: f32 = 0.75;

/// All keys managed by [`PreferenceStore`]
pub const ALL_KEYS: [&str; 6] = [
    KEY_QUEUE,
    KEY_CURRENT_INDEX,
    KEY_STREAM_QUALITY,
    KEY_DOWNLOAD_QUALITY,
    KEY_IMAGE_QUALITY,
    KEY_VOLUME,
];

/// Restored and write-through player preferences
pub struct PreferenceStore {
    pub queue: PersistentCell<Vec<Track>>,
    pub current_index: PersistentCell<usize>,
    pub stream_quality: PersistentCell<StreamQuality>,
    pub download_quality: PersistentCell<StreamQuality>,
    pub image_quality: PersistentCell<ImageQuality>,
    /// Last non-zero volume level; never 0 while muted
    pub volume: PersistentCell<f32>,
    store: Arc<dyn KeyValueStore>,
}

impl PreferenceStore {
    /// Restore preferences from `store`
    ///
    /// Missing, undecodable or out-of-range values fall back to their
    /// defaults. A stored index past the end of the stored queue is clamped.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let prefs = Self {
            queue: PersistentCell::load(store.clone(), KEY_QUEUE, Vec::new()),
            current_index: PersistentCell::load(store.clone(), KEY_CURRENT_INDEX, 0),
            stream_quality: PersistentCell::load(
                store.clone(),
                KEY_STREAM_QUALITY,
                StreamQuality::default(),
            ),
            download_quality: PersistentCell::load(
                store.clone(),
                KEY_DOWNLOAD_QUALITY,
                StreamQuality::default(),
            ),
            image_quality: PersistentCell::load(
                store.clone(),
                KEY_IMAGE_QUALITY,
                ImageQuality::default(),
            ),
            volume: PersistentCell::load_validated(
                store.clone(),
                KEY_VOLUME,
                DEFAULT_VOLUME,
                |v: &f32| v.is_finite() && (0.0..=1.0).contains(v),
            ),
            store,
        };

        let len = prefs.queue.with(Vec::len);
        let index = prefs.current_index.get();
        let clamped = clamp(index, len);
        if clamped != index {
            tracing::debug!(index, len, clamped, "Clamped restored queue index");
            prefs.current_index.set(clamped);
        }

        tracing::debug!(
            queue_len = len,
            index = clamped,
            stream_quality = %prefs.stream_quality.get(),
            volume = prefs.volume.get(),
            "Restored preferences"
        );

        prefs
    }

    /// Preferences backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::new()))
    }

    /// Replace the queue and current index together
    ///
    /// The index is clamped into the new queue (0 for an empty queue).
    pub fn set_queue(&self, tracks: Vec<Track>, index: usize) {
        let index = clamp(index, tracks.len());
        self.queue.set(tracks);
        self.current_index.set(index);
    }

    /// Track at the current index, if the queue is non-empty
    pub fn current_track(&self) -> Option<Track> {
        let index = self.current_index.get();
        self.queue.with(|q| q.get(index).cloned())
    }

    /// Reset every preference to its default and clear the stored keys
    pub fn reset(&self) {
        self.queue.set(Vec::new());
        self.current_index.set(0);
        self.stream_quality.set(StreamQuality::default());
        self.download_quality.set(StreamQuality::default());
        self.image_quality.set(ImageQuality::default());
        self.volume.set(DEFAULT_VOLUME);

        for key in ALL_KEYS {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear preference");
            }
        }
    }
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("queue_len", &self.queue.with(Vec::len))
            .field("current_index", &self.current_index.get())
            .field("stream_quality", &self.stream_quality.get())
            .field("download_quality", &self.download_quality.get())
            .field("image_quality", &self.image_quality.get())
            .field("volume", &self.volume.get())
            .finish_non_exhaustive()
    }
}

fn clamp(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}
