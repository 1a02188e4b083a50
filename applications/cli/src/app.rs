//! Subcommand implementations

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncBufRead;
use tokio::sync::{broadcast, mpsc};
use tunez_core::{ImageQuality, StreamQuality, Track};
use tunez_playback::{spawn_player, PlaybackController, PlaybackEvent, PlayerCommand, Surface};
use tunez_storage::{KeyValueStore, PreferenceStore, RedbStore, SessionState};

use crate::config::CliConfig;
use crate::engine::SimulatedEngine;
use crate::error::{CliError, Result};
use crate::shell;

/// Open the durable preference store named in the config
pub fn open_preferences(config: &CliConfig) -> Result<PreferenceStore> {
    let store = RedbStore::open(&config.storage.path)?;
    tracing::debug!(path = %config.storage.path.display(), "Preferences opened");
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(PreferenceStore::load(store))
}

/// Read a JSON array of tracks
pub fn load_queue_file(path: &Path) -> Result<Vec<Track>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| CliError::QueueFile(format!("{}: {e}", path.display())))
}

/// Stored preferences, as printed by `prefs show`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceSnapshot {
    pub queue_len: usize,
    pub current_index: usize,
    pub current_track: Option<String>,
    pub stream_quality: StreamQuality,
    pub download_quality: StreamQuality,
    pub image_quality: ImageQuality,
    pub volume: f32,
}

impl PreferenceSnapshot {
    pub fn capture(prefs: &PreferenceStore) -> Self {
        Self {
            queue_len: prefs.queue.with(Vec::len),
            current_index: prefs.current_index.get(),
            current_track: prefs.current_track().map(|track| track.name),
            stream_quality: prefs.stream_quality.get(),
            download_quality: prefs.download_quality.get(),
            image_quality: prefs.image_quality.get(),
            volume: prefs.volume.get(),
        }
    }
}

/// Run the interactive player until `input` ends or says `quit`
///
/// A queue given here replaces the stored one and starts playing;
/// otherwise the stored queue waits for the first `play`.
pub async fn play<R, W>(
    config: &CliConfig,
    queue: Option<Vec<Track>>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let prefs = Arc::new(open_preferences(config)?);
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = SimulatedEngine::new(config.engine.clone(), engine_tx);

    let controller = PlaybackController::new(
        engine,
        prefs,
        Arc::new(SessionState::new()),
        config.playback.clone(),
    );
    let player = spawn_player(controller, engine_rx);
    tracing::info!("Player started");

    let printer = tokio::spawn(print_events(player.subscribe()));

    player.send(PlayerCommand::MountSurface(Surface::PlayerBar))?;
    if let Some(tracks) = queue {
        player.send(PlayerCommand::ReplaceQueue { tracks, start: 0 })?;
    }

    let result = shell::run(&player, input, out).await;

    player.shutdown().await;
    printer.abort();
    tracing::info!("Player stopped");
    result
}

async fn print_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = shell::render_event(&event) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
