/// CLI configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tunez_playback::PlaybackConfig;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tunez.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Preferences database file
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

/// Simulated audio engine behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Buffering time before a source becomes ready
    pub load_latency_ms: u64,

    /// Playback clock speed (2.0 plays a track in half the time)
    pub time_scale: f64,

    /// Length reported for every source
    pub track_secs: f64,

    /// Reset the output level to zero on every source change
    pub reset_volume_on_load: bool,

    /// Ignore `set_volume` while a source is still buffering
    pub drop_volume_before_ready: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `tunez.toml` is used if
    /// present. `TUNEZ_`-prefixed variables override both, with `__`
    /// between section and key (`TUNEZ_ENGINE__TIME_SCALE=4`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TUNEZ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.engine.time_scale.is_finite() && self.engine.time_scale > 0.0) {
            return Err(CliError::Config(format!(
                "engine.time_scale must be positive, got {}",
                self.engine.time_scale
            )));
        }

        if !(self.engine.track_secs.is_finite() && self.engine.track_secs > 0.0) {
            return Err(CliError::Config(format!(
                "engine.track_secs must be positive, got {}",
                self.engine.track_secs
            )));
        }

        if self.playback.reconcile_interval_ms == 0 || self.playback.position_poll_interval_ms == 0 {
            return Err(CliError::Config(
                "playback intervals must be at least 1 ms".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/tunez.redb")
}

fn default_log_filter() -> String {
    "tunez=info".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            load_latency_ms: 250,
            time_scale: 1.0,
            track_secs: 180.0,
            reset_volume_on_load: false,
            drop_volume_before_ready: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
