/// CLI error types
use thiserror::Error;
use tunez_playback::PlaybackError;
use tunez_storage::StorageError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid queue file: {0}")]
    QueueFile(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
