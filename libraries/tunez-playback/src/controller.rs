//! Playback controller
//!
//! Owns one playback session: the queue and index (in the preference
//! store), shuffle/loop flags (in the session state), the volume and the
//! audio engine. Every UI surface drives playback through this type and
//! observes it through the state cells and the drained [`PlaybackEvent`]s.
//!
//! The controller is a plain synchronous state machine. Timers (volume
//! reconciliation ticks, position polling) are owned by the host, which
//! calls [`PlaybackController::reconcile_tick`] and
//! [`PlaybackController::poll_position`]; see [`crate::driver`].

use std::sync::Arc;

use serde::Serialize;
use tunez_core::{
    ImageQuality, ImageResolver, QualityLadder, SourceResolver, StreamQuality, Track,
};
use tunez_storage::{PreferenceStore, SessionState};

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::keybinds::{stepped_volume, KeyInput, Shortcut, ShortcutAction};
use crate::position::PositionTracker;
use crate::queue::{clamp_index, index_after_move, index_after_removal, move_item};
use crate::reconcile::{ReconcileStep, VolumeReconciler};
use crate::selection::{IndexChoice, IndexSelector};
use crate::shuffle::ShufflePicker;
use crate::source::{AudioEngine, EngineEvent, EngineEventKind, LoadOptions};
use crate::types::{
    EngineStatus, LoopMode, PlaybackConfig, PlaybackMode, PlaybackState, Surface, VolumeState,
};
use crate::volume::VolumeControl;

/// Notice shown when playlist looping turns on
pub const NOTICE_LOOP_PLAYLIST: &str = "Looping playlist";

/// Notice shown when track looping turns on
pub const NOTICE_LOOP_TRACK: &str = "Playing current song on repeat";

/// Notice shown when looping turns off
pub const NOTICE_LOOP_OFF: &str = "Looping disabled";

/// The source currently handed to the engine
#[derive(Debug, Clone)]
struct LoadedSource {
    generation: u64,
    index: usize,
    track_id: String,
    url: String,
    failed: bool,
}

/// Point-in-time view of the whole session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub track: Option<Track>,
    pub index: usize,
    pub queue_len: usize,
    pub engine: EngineStatus,
    pub volume: VolumeState,
    pub displayed_volume: f32,
    pub mode: PlaybackMode,
    pub player_init: bool,
    pub stream_quality: StreamQuality,
    pub download_quality: StreamQuality,
    pub image_quality: ImageQuality,
    pub last_error: Option<String>,
}

/// Central playback control
///
/// Orchestrates:
/// - Arming (nothing reaches the engine before the first user gesture)
/// - Skip/track-end index selection under shuffle and loop rules
/// - Queue edits that keep the current index in bounds
/// - Volume, mute and the bounded volume reconciliation loop
/// - Seek bars and position polling per mounted surface
/// - Generation tagging so stale engine callbacks are dropped
pub struct PlaybackController<E> {
    engine: E,
    prefs: Arc<PreferenceStore>,
    session: Arc<SessionState>,
    sources: Arc<dyn SourceResolver>,
    images: Arc<dyn ImageResolver>,
    config: PlaybackConfig,

    selector: IndexSelector,
    volume: VolumeControl,
    reconciler: VolumeReconciler,
    tracker: PositionTracker,

    // Bumped on every load and unload
    generation: u64,
    loaded: Option<LoadedSource>,
    state: PlaybackState,
    last_error: Option<String>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<E: AudioEngine> PlaybackController<E> {
    /// Create a controller around `engine`
    ///
    /// The volume is restored from the preference store and pushed to the
    /// engine straight away; the engine may drop it, in which case the
    /// first load re-applies it.
    pub fn new(
        mut engine: E,
        prefs: Arc<PreferenceStore>,
        session: Arc<SessionState>,
        config: PlaybackConfig,
    ) -> Self {
        let volume = VolumeControl::new(prefs.volume.get());
        engine.set_volume(volume.level());

        Self {
            engine,
            prefs,
            session,
            sources: Arc::new(QualityLadder),
            images: Arc::new(QualityLadder),
            selector: IndexSelector::new(ShufflePicker::from_seed(config.shuffle_seed)),
            volume,
            reconciler: VolumeReconciler::new(config.reconcile_attempts, config.volume_tolerance),
            tracker: PositionTracker::new(),
            config,
            generation: 0,
            loaded: None,
            state: PlaybackState::Idle,
            last_error: None,
            pending_events: Vec::new(),
        }
    }

    /// Replace the source and artwork resolvers
    #[must_use]
    pub fn with_resolvers(
        mut self,
        sources: Arc<dyn SourceResolver>,
        images: Arc<dyn ImageResolver>,
    ) -> Self {
        self.sources = sources;
        self.images = images;
        self
    }

    // ===== Transport =====

    /// Play or pause
    ///
    /// The first call only arms the player, which loads the current track
    /// with autoplay. After a failed load this retries the same source.
    pub fn play_pause(&mut self) {
        if !self.arm() {
            tracing::debug!("Player armed");
            self.load_current(false);
            return;
        }

        match &self.loaded {
            Some(source) if !source.failed => self.engine.toggle_play_pause(),
            _ => self.load_current(true),
        }
    }

    /// Skip forward per the shuffle/loop rules
    pub fn skip_next(&mut self) {
        let choice = self
            .selector
            .next(self.current_index(), self.queue_len(), self.mode());
        self.apply_skip(choice);
    }

    /// Skip back per the shuffle/loop rules
    pub fn skip_prev(&mut self) {
        let choice = self
            .selector
            .previous(self.current_index(), self.queue_len(), self.mode());
        self.apply_skip(choice);
    }

    /// Seek within the current source
    ///
    /// The target is clamped to `[0, duration]`. Returns the position
    /// actually sought to, or `None` when nothing is loaded.
    pub fn seek(&mut self, target_secs: f64) -> Option<f64> {
        if !self.has_source() {
            return None;
        }

        let duration = self.engine.duration().max(0.0);
        let target = if target_secs.is_finite() {
            target_secs.clamp(0.0, duration)
        } else {
            0.0
        };

        self.engine.seek(target);
        self.record_position(target);
        Some(target)
    }

    // ===== Volume =====

    /// Set the volume level (clamped to `[0, 1]`)
    ///
    /// Zero mutes; a positive level unmutes and is persisted as the level
    /// to restore later. While a source is loaded the level is re-applied
    /// until the engine reports it.
    pub fn set_volume(&mut self, level: f32) {
        let before = self.volume.state();
        let level = self.volume.set_level(level);

        if level > 0.0 {
            self.prefs.volume.set(self.volume.last_non_zero());
        }

        if self.has_source() {
            self.engine.set_muted(self.volume.is_muted());
            self.engine.set_volume(level);
            self.restart_reconcile();
        }

        if self.volume.state() != before {
            self.emit_volume_changed();
        }
    }

    /// Flip mute, restoring the last non-zero level if the engine is silent
    pub fn toggle_mute(&mut self) {
        let engine_volume = if self.has_source() {
            self.engine.volume()
        } else {
            None
        };

        let muted = self.volume.toggle_mute(engine_volume);
        tracing::debug!(muted, level = self.volume.level(), "Mute toggled");

        if self.has_source() {
            self.engine.set_muted(muted);
            if !muted {
                self.engine.set_volume(self.volume.level());
            }
            self.restart_reconcile();
        }

        self.emit_volume_changed();
    }

    // ===== Modes =====

    pub fn toggle_shuffle(&mut self) {
        let mut mode = self.mode();
        mode.shuffle = !mode.shuffle;
        self.apply_mode(mode);
    }

    /// Toggle playlist looping; turning it on clears track looping
    pub fn toggle_loop_playlist(&mut self) {
        let next = if self.session.loop_playlist.get() {
            LoopMode::Off
        } else {
            LoopMode::Playlist
        };
        self.apply_mode(self.mode().with_loop(next));
    }

    /// Toggle track looping; turning it on clears playlist looping
    pub fn toggle_loop_track(&mut self) {
        let next = if self.session.loop_track.get() {
            LoopMode::Off
        } else {
            LoopMode::Track
        };
        self.apply_mode(self.mode().with_loop(next));
    }

    /// Step through the loop modes, emitting a notice
    ///
    /// A single-track queue toggles track looping. Longer queues cycle
    /// off, playlist, track, off.
    pub fn cycle_loop(&mut self) {
        let current = self.mode().loop_mode();
        let next = if self.queue_len() == 1 {
            if current == LoopMode::Track {
                LoopMode::Off
            } else {
                LoopMode::Track
            }
        } else {
            match current {
                LoopMode::Off => LoopMode::Playlist,
                LoopMode::Playlist => LoopMode::Track,
                LoopMode::Track => LoopMode::Off,
            }
        };

        self.apply_mode(self.mode().with_loop(next));
        let notice = match next {
            LoopMode::Off => NOTICE_LOOP_OFF,
            LoopMode::Playlist => NOTICE_LOOP_PLAYLIST,
            LoopMode::Track => NOTICE_LOOP_TRACK,
        };
        self.emit_notice(notice);
    }

    // ===== Queue =====

    /// Replace the queue and start playing at `start`
    ///
    /// Selecting tracks is a user gesture, so this also arms the player.
    /// `start` is clamped into the new queue.
    pub fn replace_queue(&mut self, tracks: Vec<Track>, start: usize) {
        tracing::debug!(len = tracks.len(), start, "Replacing queue");
        self.prefs.set_queue(tracks, start);
        self.emit_queue_changed();
        self.arm();
        self.load_current(true);
    }

    /// Add tracks to the end of the queue
    pub fn append_to_queue(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }

        let was_empty = self.queue_len() == 0;
        self.prefs.queue.update(|queue| queue.extend(tracks));
        if was_empty {
            self.prefs.current_index.set(0);
        }

        self.emit_queue_changed();
        self.load_current(false);
    }

    /// Jump to `index` and play it
    pub fn play_index(&mut self, index: usize) -> Result<()> {
        let len = self.queue_len();
        if index >= len {
            return Err(PlaybackError::out_of_bounds(index, len));
        }

        self.prefs.current_index.set(index);
        self.arm();
        self.load_current(true);
        Ok(())
    }

    /// Remove the track at `index`
    ///
    /// Removing the current track moves playback to the one that takes its
    /// place; removing the last remaining track stops playback.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Track> {
        let len = self.queue_len();
        if index >= len {
            return Err(PlaybackError::out_of_bounds(index, len));
        }

        let current = self.current_index();
        let mut removed = None;
        self.prefs.queue.update(|queue| removed = Some(queue.remove(index)));
        let removed = removed.ok_or_else(|| PlaybackError::out_of_bounds(index, len))?;

        let new_index = index_after_removal(current, index, len - 1);
        self.prefs.current_index.set(new_index);
        if index != current {
            self.follow_current(new_index);
        }

        self.emit_queue_changed();
        self.load_current(false);
        Ok(removed)
    }

    /// Move the track at `from` to `to`; the current track keeps playing
    pub fn move_in_queue(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.queue_len();
        if from >= len {
            return Err(PlaybackError::out_of_bounds(from, len));
        }
        if to >= len {
            return Err(PlaybackError::out_of_bounds(to, len));
        }
        if from == to {
            return Ok(());
        }

        let new_index = index_after_move(self.current_index(), from, to);
        self.prefs.queue.update(|queue| move_item(queue, from, to));
        self.prefs.current_index.set(new_index);
        self.follow_current(new_index);

        self.emit_queue_changed();
        Ok(())
    }

    /// Keep only the first `len` tracks, clamping the current index
    pub fn truncate_queue(&mut self, len: usize) {
        if len >= self.queue_len() {
            return;
        }

        self.prefs.queue.update(|queue| queue.truncate(len));
        let index = clamp_index(self.current_index(), len);
        self.prefs.current_index.set(index);

        self.emit_queue_changed();
        self.load_current(false);
    }

    pub fn clear_queue(&mut self) {
        self.truncate_queue(0);
    }

    // ===== Quality =====

    /// Change the streaming tier; reloads the current track if armed
    pub fn set_stream_quality(&mut self, quality: StreamQuality) {
        if self.prefs.stream_quality.set(quality) {
            tracing::debug!(%quality, "Stream quality changed");
            self.load_current(false);
        }
    }

    pub fn set_download_quality(&mut self, quality: StreamQuality) {
        self.prefs.download_quality.set(quality);
    }

    pub fn set_image_quality(&mut self, quality: ImageQuality) {
        self.prefs.image_quality.set(quality);
    }

    /// Download link for `track` at the preferred download tier
    pub fn download_url(&self, track: &Track) -> Option<String> {
        self.sources
            .resolve(track, self.prefs.download_quality.get())
    }

    /// Artwork for `track` at the preferred image tier
    pub fn image_url(&self, track: &Track) -> String {
        self.images
            .resolve_image(track, self.prefs.image_quality.get())
    }

    // ===== Surfaces =====

    pub fn mount_surface(&mut self, surface: Surface) {
        if self.tracker.mount(surface) {
            tracing::debug!(surface = surface.as_str(), "Surface mounted");
        }
    }

    /// Unmounting drops any drag in progress on that surface
    pub fn unmount_surface(&mut self, surface: Surface) {
        if self.tracker.unmount(surface) {
            tracing::debug!(surface = surface.as_str(), "Surface unmounted");
        }
    }

    /// Open or close the now-playing overlay (which shows the position)
    pub fn set_now_playing_open(&mut self, open: bool) {
        self.session.now_playing_open.set(open);
        if open {
            self.mount_surface(Surface::NowPlayingOverlay);
        } else {
            self.unmount_surface(Surface::NowPlayingOverlay);
        }
    }

    /// Whether a text field has focus
    pub fn set_typing(&mut self, typing: bool) {
        self.session.typing.set(typing);
    }

    pub fn begin_seek_drag(&mut self, surface: Surface, position_secs: f64) -> bool {
        self.tracker.begin_drag(surface, position_secs)
    }

    pub fn update_seek_drag(&mut self, surface: Surface, position_secs: f64) {
        self.tracker.update_drag(surface, position_secs);
    }

    /// Release a drag and seek to where it ended
    pub fn end_seek_drag(&mut self, surface: Surface) -> Option<f64> {
        let target = self.tracker.end_drag(surface)?;
        self.seek(target)
    }

    /// Whether the host should keep polling the position
    pub fn polling_active(&self) -> bool {
        self.has_source() && self.tracker.polling_active()
    }

    /// Read the engine position if some surface shows it live
    pub fn poll_position(&mut self) -> Option<f64> {
        if !self.polling_active() {
            return None;
        }

        let position = self.engine.position();
        if position != self.tracker.last_polled() {
            self.record_position(position);
        }
        Some(position)
    }

    /// Position `surface` should display; its drag value while dragging
    pub fn surface_position(&self, surface: Surface) -> Option<f64> {
        self.tracker.surface_position(surface)
    }

    // ===== Keyboard =====

    /// Run the shortcut bound to `input`, if any
    pub fn handle_key(&mut self, input: &KeyInput) -> Option<ShortcutAction> {
        let action = Shortcut::from_key(input, self.session.typing.get())?;
        self.apply_shortcut(action);
        Some(action)
    }

    pub fn apply_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::PlayPause => self.play_pause(),
            ShortcutAction::Next => self.skip_next(),
            ShortcutAction::Previous => self.skip_prev(),
            ShortcutAction::VolumeUp => self.step_volume(self.config.volume_step),
            ShortcutAction::VolumeDown => self.step_volume(-self.config.volume_step),
            ShortcutAction::CycleLoop => self.cycle_loop(),
            ShortcutAction::ToggleShuffle => self.toggle_shuffle(),
            ShortcutAction::ToggleMute => self.toggle_mute(),
        }
    }

    fn step_volume(&mut self, delta: f32) {
        let reported = if self.has_source() {
            self.engine.volume()
        } else {
            Some(self.volume.level())
        };
        let level = stepped_volume(reported, self.volume.last_non_zero(), delta);
        self.set_volume(level);
    }

    // ===== Engine integration =====

    /// Apply an asynchronous engine notification
    ///
    /// Events whose generation does not match the current source are
    /// discarded.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let current = self.loaded.as_ref().map(|source| source.generation);
        if current != Some(event.generation) {
            tracing::debug!(
                generation = event.generation,
                current = ?current,
                "Discarding stale engine event"
            );
            return;
        }

        match event.kind {
            EngineEventKind::Loaded => self.on_loaded(),
            EngineEventKind::Ended => self.on_track_end(),
            EngineEventKind::Failed(message) => self.on_load_failed(message),
        }
    }

    /// Natural end of the current track
    pub fn on_track_end(&mut self) {
        let choice =
            self.selector
                .after_track_end(self.current_index(), self.queue_len(), self.mode());
        tracing::debug!(?choice, "Track ended");

        match choice {
            IndexChoice::Move(index) => {
                self.prefs.current_index.set(index);
                self.load_current(false);
            }
            IndexChoice::Restart => self.restart_current(true),
            IndexChoice::Stay => {}
        }
    }

    /// One volume reconciliation attempt for run `generation`
    pub fn reconcile_tick(&mut self, generation: u64) -> ReconcileStep {
        if self.volume.is_muted() || !self.has_source() {
            self.reconciler.cancel();
            return ReconcileStep::Idle;
        }

        let target = self.volume.level();
        let step = self.reconciler.step(generation, &mut self.engine, target);
        if let ReconcileStep::Converged { attempt } = step {
            tracing::debug!(generation, attempt, target, "Volume reconciled");
        }
        step
    }

    /// Generation of the active reconciliation run, if any
    pub fn reconcile_generation(&self) -> Option<u64> {
        self.reconciler.generation()
    }

    /// Take queued events, recording any engine state transition first
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.refresh_state();
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Queries =====

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.prefs
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn mode(&self) -> PlaybackMode {
        PlaybackMode {
            shuffle: self.session.shuffle.get(),
            loop_playlist: self.session.loop_playlist.get(),
            loop_track: self.session.loop_track.get(),
        }
    }

    pub fn volume_state(&self) -> VolumeState {
        self.volume.state()
    }

    /// Volume a UI should show (0 while muted)
    pub fn displayed_volume(&self) -> f32 {
        self.volume.displayed()
    }

    pub fn current_index(&self) -> usize {
        self.prefs.current_index.get()
    }

    pub fn queue_len(&self) -> usize {
        self.prefs.queue.with(Vec::len)
    }

    pub fn queue(&self) -> Vec<Track> {
        self.prefs.queue.get()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.prefs.current_track()
    }

    pub fn is_armed(&self) -> bool {
        self.session.player_init.get()
    }

    /// Generation of the loaded source; events must carry this
    pub fn loaded_generation(&self) -> Option<u64> {
        self.loaded.as_ref().map(|source| source.generation)
    }

    pub fn state(&self) -> PlaybackState {
        self.derive_state()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn engine_status(&self) -> EngineStatus {
        if !self.has_source() {
            return EngineStatus::default();
        }

        EngineStatus {
            ready: self.engine.is_ready(),
            loading: self.engine.is_loading(),
            playing: self.engine.is_playing(),
            position_secs: self.engine.position(),
            duration_secs: self.engine.duration(),
        }
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.derive_state(),
            track: self.current_track(),
            index: self.current_index(),
            queue_len: self.queue_len(),
            engine: self.engine_status(),
            volume: self.volume.state(),
            displayed_volume: self.volume.displayed(),
            mode: self.mode(),
            player_init: self.is_armed(),
            stream_quality: self.prefs.stream_quality.get(),
            download_quality: self.prefs.download_quality.get(),
            image_quality: self.prefs.image_quality.get(),
            last_error: self.last_error.clone(),
        }
    }

    // ===== Internals =====

    /// Arm the player; returns whether it was already armed
    fn arm(&mut self) -> bool {
        !self.session.player_init.set(true)
    }

    fn has_source(&self) -> bool {
        self.loaded.is_some()
    }

    fn apply_skip(&mut self, choice: IndexChoice) {
        let was_armed = self.arm();
        tracing::debug!(?choice, was_armed, "Skip");

        match choice {
            IndexChoice::Move(index) => {
                self.prefs.current_index.set(index);
            }
            IndexChoice::Restart if was_armed => self.restart_current(false),
            IndexChoice::Restart | IndexChoice::Stay => {}
        }

        self.load_current(false);
    }

    /// Make the engine play the current queue entry
    ///
    /// Loads only when the player is armed and the wanted (index, track,
    /// url) differs from what is loaded. A failed source is reloaded only
    /// when `retry_failed` is set, i.e. on an explicit user action.
    fn load_current(&mut self, retry_failed: bool) {
        if !self.is_armed() {
            return;
        }

        let index = self.current_index();
        let Some(track) = self.current_track() else {
            self.unload();
            return;
        };

        let quality = self.prefs.stream_quality.get();
        let Some(url) = self.sources.resolve(&track, quality) else {
            tracing::warn!(track_id = %track.id, %quality, "Track has no playable source");
            self.unload();
            self.fail(PlaybackError::NoSource(track.name).to_string());
            return;
        };

        if let Some(source) = &self.loaded {
            let same = source.index == index && source.track_id == track.id && source.url == url;
            if same && !(source.failed && retry_failed) {
                return;
            }
        }

        self.generation += 1;
        let generation = self.generation;
        let previous_track_id = self.loaded.take().map(|source| source.track_id);
        self.reconciler.cancel();
        self.last_error = None;

        tracing::debug!(generation, index, track_id = %track.id, %quality, "Loading source");
        self.engine.load(
            &url,
            LoadOptions {
                autoplay: true,
                initial_mute: self.volume.is_muted(),
                generation,
            },
        );
        self.engine.set_looping(self.session.loop_track.get());

        self.loaded = Some(LoadedSource {
            generation,
            index,
            track_id: track.id.clone(),
            url,
            failed: false,
        });

        self.pending_events.push(PlaybackEvent::TrackChanged {
            index,
            track_id: track.id,
            previous_track_id,
        });
        self.record_position(0.0);

        if !self.volume.is_muted() {
            self.engine.set_volume(self.volume.level());
            self.restart_reconcile();
        }
    }

    /// Drop the current source (empty queue or unplayable track)
    fn unload(&mut self) {
        if self.loaded.take().is_none() {
            return;
        }

        tracing::debug!("Unloading source");
        self.generation += 1;
        self.engine.pause();
        self.reconciler.cancel();
        self.record_position(0.0);
    }

    /// Point the loaded source at its new queue position after an edit
    fn follow_current(&mut self, index: usize) {
        if let Some(source) = self.loaded.as_mut() {
            source.index = index;
        }
    }

    fn restart_current(&mut self, resume: bool) {
        if !self.loaded.as_ref().is_some_and(|source| !source.failed) {
            return;
        }

        self.engine.seek(0.0);
        if resume && !self.engine.is_playing() {
            self.engine.play();
        }
        self.record_position(0.0);
    }

    fn on_loaded(&mut self) {
        tracing::debug!(generation = self.generation, "Source ready");

        let muted = self.volume.is_muted();
        self.engine.set_muted(muted);
        self.engine.set_looping(self.session.loop_track.get());
        if !muted {
            self.engine.set_volume(self.volume.level());
            self.restart_reconcile();
        }

        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_secs: self.engine.position(),
            duration_secs: self.engine.duration(),
        });
    }

    /// Surface a load failure; index and arming stay as they are
    fn on_load_failed(&mut self, message: String) {
        tracing::warn!(generation = self.generation, error = %message, "Source failed to load");

        if let Some(source) = self.loaded.as_mut() {
            source.failed = true;
        }
        self.reconciler.cancel();
        self.fail(PlaybackError::Engine(message).to_string());
    }

    fn fail(&mut self, message: String) {
        self.last_error = Some(message.clone());
        self.pending_events.push(PlaybackEvent::Error { message });
    }

    /// Start a fresh reconciliation run, or stop it while muted
    fn restart_reconcile(&mut self) {
        if self.volume.is_muted() {
            self.reconciler.cancel();
        } else {
            let run = self.reconciler.start();
            tracing::trace!(run, target = self.volume.level(), "Volume reconciliation started");
        }
    }

    fn apply_mode(&mut self, mode: PlaybackMode) {
        let mut changed = self.session.shuffle.set(mode.shuffle);
        changed |= self.session.loop_playlist.set(mode.loop_playlist);
        changed |= self.session.loop_track.set(mode.loop_track);

        if !changed {
            return;
        }

        tracing::debug!(
            shuffle = mode.shuffle,
            loop_mode = mode.loop_mode().as_str(),
            "Playback mode changed"
        );
        if self.has_source() {
            self.engine.set_looping(mode.loop_track);
        }
        self.pending_events.push(PlaybackEvent::ModeChanged { mode });
    }

    fn record_position(&mut self, position_secs: f64) {
        self.tracker.record(position_secs);
        self.session.current_time.set(position_secs);
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_secs,
            duration_secs: if self.has_source() {
                self.engine.duration()
            } else {
                0.0
            },
        });
    }

    fn derive_state(&self) -> PlaybackState {
        match &self.loaded {
            None => PlaybackState::Idle,
            Some(source) if source.failed => PlaybackState::Idle,
            Some(_) if self.engine.is_loading() => PlaybackState::Loading,
            Some(_) if self.engine.is_playing() => PlaybackState::Playing,
            Some(_) => PlaybackState::Paused,
        }
    }

    fn refresh_state(&mut self) {
        let state = self.derive_state();
        if state != self.state {
            tracing::debug!(from = %self.state, to = %state, "Playback state changed");
            self.state = state;
            self.pending_events.push(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.volume.displayed(),
            muted: self.volume.is_muted(),
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue_len(),
            current_index: self.current_index(),
        });
    }

    fn emit_notice(&mut self, message: &str) {
        self.pending_events.push(PlaybackEvent::Notice {
            message: message.to_string(),
        });
    }
}
