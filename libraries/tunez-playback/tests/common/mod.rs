//! Shared fixtures for playback integration tests

use std::sync::{Arc, Mutex, MutexGuard, Once};

use tunez_core::{StreamQuality, Track};
use tunez_playback::{AudioEngine, LoadOptions, PlaybackConfig, PlaybackController};
use tunez_storage::{PreferenceStore, SessionState};

static INIT: Once = Once::new();

/// Route tracing output through the test harness
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Everything the mock engine was told, plus what it reports back
#[derive(Debug, Default)]
pub struct EngineState {
    pub loads: Vec<(String, LoadOptions)>,
    pub seeks: Vec<f64>,
    pub volume_calls: Vec<f32>,
    pub volume: Option<f32>,
    pub muted: bool,
    pub looping: bool,
    pub playing: bool,
    pub ready: bool,
    pub autoplay: bool,
    pub position: f64,
    pub duration: f64,
    /// `set_volume` is ignored until the source is ready
    pub drop_volume_until_ready: bool,
    /// Each load resets the reported volume to zero
    pub reset_volume_on_load: bool,
}

/// Mock engine whose state stays inspectable after the controller takes it
#[derive(Debug, Clone)]
pub struct SharedEngine(Arc<Mutex<EngineState>>);

impl SharedEngine {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(EngineState {
            volume: Some(1.0),
            duration: 180.0,
            ..EngineState::default()
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, EngineState> {
        self.0.lock().expect("engine state poisoned")
    }

    /// Finish buffering: ready, and playing if autoplay was requested
    pub fn finish_loading(&self) {
        let mut state = self.state();
        state.ready = true;
        if state.autoplay {
            state.playing = true;
        }
    }

    pub fn load_count(&self) -> usize {
        self.state().loads.len()
    }

    pub fn last_url(&self) -> Option<String> {
        self.state().loads.last().map(|(url, _)| url.clone())
    }

    pub fn last_generation(&self) -> Option<u64> {
        self.state().loads.last().map(|(_, opts)| opts.generation)
    }
}

impl Default for SharedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for SharedEngine {
    fn load(&mut self, url: &str, options: LoadOptions) {
        let mut state = self.state();
        state.loads.push((url.to_string(), options));
        state.ready = false;
        state.playing = false;
        state.autoplay = options.autoplay;
        state.position = 0.0;
        state.muted = options.initial_mute;
        if state.reset_volume_on_load {
            state.volume = Some(0.0);
        }
    }

    fn play(&mut self) {
        let mut state = self.state();
        if !state.loads.is_empty() {
            state.playing = true;
        }
    }

    fn pause(&mut self) {
        self.state().playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.state();
        state.seeks.push(seconds);
        state.position = seconds;
    }

    fn position(&self) -> f64 {
        self.state().position
    }

    fn duration(&self) -> f64 {
        self.state().duration
    }

    fn volume(&self) -> Option<f32> {
        self.state().volume
    }

    fn set_volume(&mut self, level: f32) {
        let mut state = self.state();
        state.volume_calls.push(level);
        if state.ready || !state.drop_volume_until_ready {
            state.volume = Some(level);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.state().muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.state().muted
    }

    fn set_looping(&mut self, looping: bool) {
        self.state().looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.state().looping
    }

    fn is_loading(&self) -> bool {
        let state = self.state();
        !state.loads.is_empty() && !state.ready
    }

    fn is_ready(&self) -> bool {
        self.state().ready
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }
}

/// Track with a low and a high quality source
pub fn track(id: &str) -> Track {
    let mut track = Track::new(id, format!("Track {}", id.to_uppercase()));
    track
        .download_url
        .insert(StreamQuality::Low, format!("https://cdn.test/{id}_48.mp4"));
    track
        .download_url
        .insert(StreamQuality::High, format!("https://cdn.test/{id}_160.mp4"));
    track
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn test_config() -> PlaybackConfig {
    PlaybackConfig {
        shuffle_seed: Some(1234),
        ..PlaybackConfig::default()
    }
}

/// Controller over a fresh in-memory session
pub fn controller(engine: &SharedEngine) -> PlaybackController<SharedEngine> {
    controller_with(engine, Arc::new(PreferenceStore::in_memory()))
}

pub fn controller_with(
    engine: &SharedEngine,
    prefs: Arc<PreferenceStore>,
) -> PlaybackController<SharedEngine> {
    init_tracing();
    PlaybackController::new(
        engine.clone(),
        prefs,
        Arc::new(SessionState::new()),
        test_config(),
    )
}

/// Report the current load as finished to the controller
pub fn complete_load(controller: &mut PlaybackController<SharedEngine>, engine: &SharedEngine) {
    engine.finish_loading();
    let generation = engine.last_generation().expect("nothing loaded");
    controller.handle_engine_event(tunez_playback::EngineEvent::loaded(generation));
}
