//! Async player driver
//!
//! Runs a [`PlaybackController`] on one tokio task. Commands arrive over an
//! mpsc channel, engine callbacks over a second one, and every resulting
//! [`PlaybackEvent`] is rebroadcast to any number of subscribers.
//!
//! The task also owns the controller's timers:
//! - a volume reconciliation ticker, spawned per run and aborted as soon
//!   as the run finishes or is replaced
//! - a per-frame position poll, which only fires while some mounted
//!   surface shows the position live
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tunez_playback::{spawn_player, AudioEngine, PlaybackConfig, PlaybackController, PlayerCommand};
//! use tunez_storage::{PreferenceStore, SessionState};
//!
//! # async fn example<E: AudioEngine + 'static>(engine: E) -> tunez_playback::Result<()> {
//! let (engine_tx, engine_rx) = mpsc::unbounded_channel();
//! // hand `engine_tx` to the engine so it can report Loaded / Ended / Failed
//! # drop(engine_tx);
//! let controller = PlaybackController::new(
//!     engine,
//!     Arc::new(PreferenceStore::in_memory()),
//!     Arc::new(SessionState::new()),
//!     PlaybackConfig::default(),
//! );
//!
//! let player = spawn_player(controller, engine_rx);
//! let mut events = player.subscribe();
//!
//! player.send(PlayerCommand::PlayPause)?;
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tunez_core::{ImageQuality, StreamQuality, Track};

use crate::controller::{PlaybackController, PlayerStatus};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::keybinds::KeyInput;
use crate::source::{AudioEngine, EngineEvent};
use crate::types::Surface;

/// Commands sent to the player task
#[derive(Debug)]
pub enum PlayerCommand {
    /// Play/pause (arms the player on first use)
    PlayPause,

    /// Skip to next track
    Next,

    /// Go to previous track
    Previous,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Set volume (0.0-1.0)
    SetVolume(f32),

    /// Toggle mute
    ToggleMute,

    ToggleShuffle,

    ToggleLoopPlaylist,

    ToggleLoopTrack,

    /// Off -> playlist -> track -> off
    CycleLoop,

    /// Replace the queue and play from `start`
    ReplaceQueue { tracks: Vec<Track>, start: usize },

    /// Add tracks to the end of the queue
    AppendToQueue(Vec<Track>),

    /// Jump to a queue index
    PlayIndex(usize),

    /// Remove track from queue
    RemoveFromQueue(usize),

    /// Reorder the queue
    MoveInQueue { from: usize, to: usize },

    /// Keep only the first n tracks
    TruncateQueue(usize),

    /// Clear queue
    ClearQueue,

    SetStreamQuality(StreamQuality),

    SetDownloadQuality(StreamQuality),

    SetImageQuality(ImageQuality),

    MountSurface(Surface),

    UnmountSurface(Surface),

    SetNowPlayingOpen(bool),

    SetTyping(bool),

    BeginSeekDrag { surface: Surface, position: f64 },

    UpdateSeekDrag { surface: Surface, position: f64 },

    /// Release a drag, committing the seek
    EndSeekDrag(Surface),

    /// Keyboard shortcut
    Key(KeyInput),

    /// Reply with a status snapshot
    Status(oneshot::Sender<PlayerStatus>),

    /// Reply with the queue
    Queue(oneshot::Sender<Vec<Track>>),

    /// Stop the task and its timers
    Shutdown,
}

/// Handle to a running player task
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    events: broadcast::Sender<PlaybackEvent>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    /// Send a command to the player
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::PlayerClosed)
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Extra command sender, e.g. for an input thread
    pub fn command_sender(&self) -> mpsc::UnboundedSender<PlayerCommand> {
        self.commands.clone()
    }

    pub async fn status(&self) -> Result<PlayerStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::Status(tx))?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }

    pub async fn queue(&self) -> Result<Vec<Track>> {
        let (tx, rx) = oneshot::channel();
        self.send(PlayerCommand::Queue(tx))?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }

    /// Stop the player and wait for its task to finish
    pub async fn shutdown(self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Player task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start the player task
///
/// `engine_events` is the receiving end of the channel the engine reports
/// its Loaded / Ended / Failed callbacks on.
pub fn spawn_player<E>(
    controller: PlaybackController<E>,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
) -> PlayerHandle
where
    E: AudioEngine + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, _) = broadcast::channel(controller.config().event_capacity.max(1));

    let task = tokio::spawn(run(controller, command_rx, engine_events, event_tx.clone()));

    PlayerHandle {
        commands: command_tx,
        events: event_tx,
        task,
    }
}

/// Reconciliation timer for one run
struct Ticker {
    run: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Send `run` on `tx` every `period`, first tick immediately
    fn spawn(run: u64, period: Duration, attempts: u32, tx: mpsc::UnboundedSender<u64>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            for _ in 0..attempts {
                interval.tick().await;
                if tx.send(run).is_err() {
                    break;
                }
            }
        });

        Self { run, handle }
    }
}

async fn run<E: AudioEngine>(
    mut controller: PlaybackController<E>,
    mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
    mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    events: broadcast::Sender<PlaybackEvent>,
) {
    let config = controller.config().clone();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut ticker: Option<Ticker> = None;

    let mut frame = time::interval(config.position_poll_interval());
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!("Player task started");

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(PlayerCommand::Shutdown) | None => break,
                Some(command) => apply(&mut controller, command, &events),
            },
            Some(event) = engine_events.recv() => {
                controller.handle_engine_event(event);
            }
            Some(run) = tick_rx.recv() => {
                controller.reconcile_tick(run);
            }
            _ = frame.tick(), if controller.polling_active() => {
                controller.poll_position();
            }
        }

        for event in controller.drain_events() {
            // No subscribers is fine
            let _ = events.send(event);
        }

        let wanted = controller.reconcile_generation();
        if ticker.as_ref().map(|t| t.run) != wanted {
            if let Some(old) = ticker.take() {
                old.handle.abort();
            }
            ticker = wanted.map(|run| {
                Ticker::spawn(
                    run,
                    config.reconcile_interval(),
                    config.reconcile_attempts.max(1),
                    tick_tx.clone(),
                )
            });
        }
    }

    if let Some(old) = ticker.take() {
        old.handle.abort();
    }
    tracing::debug!("Player task stopped");
}

fn apply<E: AudioEngine>(
    controller: &mut PlaybackController<E>,
    command: PlayerCommand,
    events: &broadcast::Sender<PlaybackEvent>,
) {
    let result = match command {
        PlayerCommand::PlayPause => {
            controller.play_pause();
            Ok(())
        }
        PlayerCommand::Next => {
            controller.skip_next();
            Ok(())
        }
        PlayerCommand::Previous => {
            controller.skip_prev();
            Ok(())
        }
        PlayerCommand::Seek(position) => {
            controller.seek(position);
            Ok(())
        }
        PlayerCommand::SetVolume(level) => {
            controller.set_volume(level);
            Ok(())
        }
        PlayerCommand::ToggleMute => {
            controller.toggle_mute();
            Ok(())
        }
        PlayerCommand::ToggleShuffle => {
            controller.toggle_shuffle();
            Ok(())
        }
        PlayerCommand::ToggleLoopPlaylist => {
            controller.toggle_loop_playlist();
            Ok(())
        }
        PlayerCommand::ToggleLoopTrack => {
            controller.toggle_loop_track();
            Ok(())
        }
        PlayerCommand::CycleLoop => {
            controller.cycle_loop();
            Ok(())
        }
        PlayerCommand::ReplaceQueue { tracks, start } => {
            controller.replace_queue(tracks, start);
            Ok(())
        }
        PlayerCommand::AppendToQueue(tracks) => {
            controller.append_to_queue(tracks);
            Ok(())
        }
        PlayerCommand::PlayIndex(index) => controller.play_index(index),
        PlayerCommand::RemoveFromQueue(index) => controller.remove_from_queue(index).map(|_| ()),
        PlayerCommand::MoveInQueue { from, to } => controller.move_in_queue(from, to),
        PlayerCommand::TruncateQueue(len) => {
            controller.truncate_queue(len);
            Ok(())
        }
        PlayerCommand::ClearQueue => {
            controller.clear_queue();
            Ok(())
        }
        PlayerCommand::SetStreamQuality(quality) => {
            controller.set_stream_quality(quality);
            Ok(())
        }
        PlayerCommand::SetDownloadQuality(quality) => {
            controller.set_download_quality(quality);
            Ok(())
        }
        PlayerCommand::SetImageQuality(quality) => {
            controller.set_image_quality(quality);
            Ok(())
        }
        PlayerCommand::MountSurface(surface) => {
            controller.mount_surface(surface);
            Ok(())
        }
        PlayerCommand::UnmountSurface(surface) => {
            controller.unmount_surface(surface);
            Ok(())
        }
        PlayerCommand::SetNowPlayingOpen(open) => {
            controller.set_now_playing_open(open);
            Ok(())
        }
        PlayerCommand::SetTyping(typing) => {
            controller.set_typing(typing);
            Ok(())
        }
        PlayerCommand::BeginSeekDrag { surface, position } => {
            controller.begin_seek_drag(surface, position);
            Ok(())
        }
        PlayerCommand::UpdateSeekDrag { surface, position } => {
            controller.update_seek_drag(surface, position);
            Ok(())
        }
        PlayerCommand::EndSeekDrag(surface) => {
            controller.end_seek_drag(surface);
            Ok(())
        }
        PlayerCommand::Key(input) => {
            controller.handle_key(&input);
            Ok(())
        }
        PlayerCommand::Status(reply) => {
            let _ = reply.send(controller.status());
            Ok(())
        }
        PlayerCommand::Queue(reply) => {
            let _ = reply.send(controller.queue());
            Ok(())
        }
        // Handled by the run loop
        PlayerCommand::Shutdown => Ok(()),
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "Player command failed");
        let _ = events.send(PlaybackEvent::Error {
            message: e.to_string(),
        });
    }
}
