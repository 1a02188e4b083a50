//! Test helpers for storage integration tests
//!
//! Stores are REAL `redb` files in a temp directory, so reopening exercises
//! the same path a restart does.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use tunez_core::{StreamQuality, Track};
use tunez_storage::{KeyValueStore, RedbStore};

/// Database file that is removed on drop
pub struct TestStore {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("tunez.redb");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Open (or reopen) the backing store
    pub fn open(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(RedbStore::open(&self.path).expect("Failed to open store"))
    }
}

/// Test fixture: a track with one stream source
pub fn track(id: &str) -> Track {
    let mut track = Track::new(id, format!("Track {id}"));
    track
        .download_url
        .insert(StreamQuality::High, format!("https://cdn.test/{id}_160.mp4"));
    track.url = format!("https://www.jiosaavn.com/song/{id}/{id}");
    track
}
