//! Playback configuration

use crate::error::{PlaybackError, Result};
use crate::types::ShuffleStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 80)
    pub volume: u8,

    /// Initial shuffle flag (default: off)
    pub shuffle: bool,

    /// Initial repeat flag (default: off)
    pub repeat: bool,

    /// Algorithm used when shuffle is on (default: random)
    pub shuffle_strategy: ShuffleStrategy,

    /// Embedded player time polling period in milliseconds (default: 1000)
    pub poll_interval_ms: u64,

    /// Give up on a backend that has not become ready after this many
    /// seconds (default: 20, `None` waits forever)
    pub load_timeout_secs: Option<u64>,

    /// `previous()` restarts the current track instead of going back once
    /// the position is past this many seconds (default: disabled)
    pub previous_restart_threshold_secs: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 80,
            shuffle: false,
            repeat: false,
            shuffle_strategy: ShuffleStrategy::Random,
            poll_interval_ms: 1000,
            load_timeout_secs: Some(20),
            previous_restart_threshold_secs: None,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables use the `CADENCE_PLAYBACK_` prefix, e.g.
    /// `CADENCE_PLAYBACK_POLL_INTERVAL_MS=500`. Missing keys fall back to
    /// [`PlaybackConfig::default`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE_PLAYBACK")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.volume > 100 {
            return Err(PlaybackError::Config(format!(
                "volume must be 0-100, got {}",
                self.volume
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.load_timeout_secs == Some(0) {
            return Err(PlaybackError::Config(
                "load_timeout_secs must be greater than zero (omit it to disable)".to_string(),
            ));
        }

        Ok(())
    }

    /// Replace out-of-range values with the nearest usable ones
    ///
    /// Used when a hand-built config fails [`validate`](Self::validate).
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.volume = self.volume.min(100);
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        if self.load_timeout_secs == Some(0) {
            self.load_timeout_secs = defaults.load_timeout_secs;
        }
        self
    }

    /// Embedded player polling period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Backend readiness watchdog, if enabled
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_secs.map(Duration::from_secs)
    }

    /// Position past which `previous()` restarts the current track
    pub fn previous_restart_threshold(&self) -> Option<Duration> {
        self.previous_restart_threshold_secs.map(Duration::from_secs)
    }
}
