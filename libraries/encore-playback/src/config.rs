//! Playback configuration

use crate::error::{PlaybackError, Result};
use crate::types::RepeatMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`ENCORE_INITIAL_VOLUME`, ...)
pub const ENV_PREFIX: &str = "ENCORE";

/// Configuration for a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 50)
    pub initial_volume: u8,

    /// Progress poll period in milliseconds (default: 1000)
    pub poll_interval_ms: u64,

    /// Initial shuffle state (default: off)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_volume: 50,
            poll_interval_ms: 1000,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables (prefixed with `ENCORE_`) override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_volume > 100 {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be 0-100, got {}",
                self.initial_volume
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Progress poll period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
