//! Simulated audio engine
//!
//! Plays nothing, but behaves like a browser audio element: sources buffer
//! for a while before they are ready, a clock advances while playing, the
//! end of a source is reported (or wraps when looping), and optionally the
//! volume quirks of real engines are reproduced.
//!
//! Completion callbacks go out on an [`EngineEvent`] channel, tagged with
//! the generation of the load they belong to. Timers are spawned on the
//! current tokio runtime, so the engine must be driven from inside one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tunez_playback::{AudioEngine, EngineEvent, LoadOptions};

use crate::config::EngineSettings;

#[derive(Debug)]
struct Inner {
    settings: EngineSettings,
    source: Option<String>,
    generation: u64,
    // Bumped whenever a pending end-of-track timer becomes invalid
    epoch: u64,
    end_timer: Option<JoinHandle<()>>,
    buffer_timer: Option<JoinHandle<()>>,
    loading: bool,
    ready: bool,
    playing: bool,
    autoplay: bool,
    muted: bool,
    looping: bool,
    volume: f32,
    // Position at `since`; the clock runs while `since` is set
    position: f64,
    since: Option<Instant>,
}

impl Inner {
    fn position(&self) -> f64 {
        let elapsed = self
            .since
            .map_or(0.0, |since| since.elapsed().as_secs_f64() * self.settings.time_scale);
        (self.position + elapsed).min(self.settings.track_secs)
    }

    fn freeze(&mut self) {
        self.position = self.position();
        self.since = None;
    }

    fn start_clock(&mut self) {
        self.playing = true;
        self.since = Some(Instant::now());
    }

    /// Invalidate and abort the pending end-of-track timer
    fn cancel_end(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
    }

    /// Wall-clock time until the source ends at the current speed
    fn remaining(&self) -> Duration {
        let secs = (self.settings.track_secs - self.position()).max(0.0) / self.settings.time_scale;
        Duration::from_secs_f64(secs)
    }
}

/// In-process [`AudioEngine`] with a simulated clock
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl SimulatedEngine {
    pub fn new(settings: EngineSettings, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                settings,
                source: None,
                generation: 0,
                epoch: 0,
                end_timer: None,
                buffer_timer: None,
                loading: false,
                ready: false,
                playing: false,
                autoplay: false,
                muted: false,
                looping: false,
                volume: 1.0,
                position: 0.0,
                since: None,
            })),
            events,
        }
    }

    /// URL of the current source
    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Engine event dropped, player is gone");
        }
    }

    /// Arm the end-of-track timer for the current clock
    fn schedule_end(&self, inner: &mut Inner) {
        inner.cancel_end();
        if !inner.playing || !inner.ready {
            return;
        }

        let epoch = inner.epoch;
        let wait = inner.remaining();
        let engine = self.clone();
        inner.end_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            engine.on_end_timer(epoch);
        }));
    }

    fn on_end_timer(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        // This task is finishing; its handle must not be aborted from here
        inner.end_timer = None;

        if inner.looping {
            inner.position = 0.0;
            inner.start_clock();
            self.schedule_end(&mut inner);
            return;
        }

        inner.position = inner.settings.track_secs;
        inner.since = None;
        inner.playing = false;
        let generation = inner.generation;
        drop(inner);

        tracing::trace!(generation, "Simulated source ended");
        self.emit(EngineEvent::ended(generation));
    }

    fn on_buffered(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation || !inner.loading {
            return;
        }
        inner.buffer_timer = None;
        inner.loading = false;

        let playable = inner
            .source
            .as_deref()
            .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"));
        if !playable {
            let url = inner.source.clone().unwrap_or_default();
            drop(inner);
            self.emit(EngineEvent::failed(
                generation,
                format!("unsupported source: {url}"),
            ));
            return;
        }

        inner.ready = true;
        if inner.autoplay {
            inner.start_clock();
            self.schedule_end(&mut inner);
        }
        drop(inner);

        tracing::trace!(generation, "Simulated source ready");
        self.emit(EngineEvent::loaded(generation));
    }
}

impl AudioEngine for SimulatedEngine {
    fn load(&mut self, url: &str, options: LoadOptions) {
        let mut inner = self.lock();
        inner.cancel_end();
        if let Some(pending) = inner.buffer_timer.take() {
            pending.abort();
        }
        inner.source = Some(url.to_string());
        inner.generation = options.generation;
        inner.loading = true;
        inner.ready = false;
        inner.playing = false;
        inner.autoplay = options.autoplay;
        inner.muted = options.initial_mute;
        inner.position = 0.0;
        inner.since = None;
        if inner.settings.reset_volume_on_load {
            inner.volume = 0.0;
        }

        let generation = options.generation;
        let latency = Duration::from_millis(inner.settings.load_latency_ms);
        let engine = self.clone();
        inner.buffer_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            engine.on_buffered(generation);
        }));
    }

    fn play(&mut self) {
        let mut inner = self.lock();
        if inner.source.is_none() {
            return;
        }
        if !inner.ready {
            // Starts once buffered
            inner.autoplay = true;
            return;
        }
        if inner.playing {
            return;
        }

        if inner.position() >= inner.settings.track_secs {
            inner.position = 0.0;
        }
        inner.start_clock();
        self.schedule_end(&mut inner);
    }

    fn pause(&mut self) {
        let mut inner = self.lock();
        inner.autoplay = false;
        if !inner.playing {
            return;
        }
        inner.freeze();
        inner.playing = false;
        inner.cancel_end();
    }

    fn seek(&mut self, seconds: f64) {
        let mut inner = self.lock();
        if !inner.ready {
            return;
        }

        inner.position = seconds.clamp(0.0, inner.settings.track_secs);
        if inner.playing {
            inner.since = Some(Instant::now());
        }
        self.schedule_end(&mut inner);
    }

    fn position(&self) -> f64 {
        self.lock().position()
    }

    fn duration(&self) -> f64 {
        let inner = self.lock();
        if inner.ready {
            inner.settings.track_secs
        } else {
            0.0
        }
    }

    fn volume(&self) -> Option<f32> {
        let inner = self.lock();
        inner.source.as_ref().map(|_| inner.volume)
    }

    fn set_volume(&mut self, level: f32) {
        let mut inner = self.lock();
        if inner.settings.drop_volume_before_ready && !inner.ready {
            tracing::trace!(level, "Simulated engine dropped set_volume");
            return;
        }
        inner.volume = level.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.lock().muted
    }

    fn set_looping(&mut self, looping: bool) {
        self.lock().looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.lock().looping
    }

    fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn is_ready(&self) -> bool {
        self.lock().ready
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }
}
