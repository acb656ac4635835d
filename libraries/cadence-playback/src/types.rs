//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track information for queue management
///
/// Immutable once enqueued. Carries everything the controller needs to pick a
/// backend and everything presentation needs to render the current track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier (dedup key and analytics key)
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist_name: String,

    /// Cover art reference (optional)
    pub artwork_url: Option<String>,

    /// Duration as known by the catalog
    ///
    /// May be a placeholder until the backend reports the real duration.
    pub duration_hint: Duration,

    /// Where the audio comes from
    pub audio_source: AudioSource,

    /// Time-coded lyric lines, ordered by start time
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
}

impl Track {
    /// Create a track with no artwork and no lyrics
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist_name: impl Into<String>,
        duration_hint: Duration,
        audio_source: AudioSource,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_name: artist_name.into(),
            artwork_url: None,
            duration_hint,
            audio_source,
            lyrics: Vec::new(),
        }
    }

    /// Backend kind this track must be played with
    pub fn backend_kind(&self) -> BackendKind {
        self.audio_source.kind()
    }

    /// Lyric line active at `position`, if any
    pub fn lyric_at(&self, position: Duration) -> Option<&LyricLine> {
        self.lyrics
            .iter()
            .find(|line| line.start <= position && position < line.end)
    }
}

/// Playable source of a track
///
/// A track has exactly one playable source at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum AudioSource {
    /// Directly playable media URL
    Direct(String),

    /// External platform media identifier (video ID)
    Embedded(String),
}

impl AudioSource {
    /// Backend kind able to play this source
    pub fn kind(&self) -> BackendKind {
        match self {
            AudioSource::Direct(_) => BackendKind::Direct,
            AudioSource::Embedded(_) => BackendKind::Embedded,
        }
    }

    /// Short label used in errors and logs
    pub fn label(&self) -> &'static str {
        self.kind().label()
    }
}

/// Playback technology selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Native media element
    Direct,

    /// Embedded external platform player
    Embedded,
}

impl BackendKind {
    /// Short label used in errors and logs
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Direct => "direct",
            BackendKind::Embedded => "embedded",
        }
    }
}

/// One caption line of a track's lyrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded, or the queue ran out
    Idle,

    /// Track selected, backend preparing it
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (also the resting state after a backend failure)
    Paused,
}

/// Shuffle algorithm used when shuffle is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleStrategy {
    /// Pure random shuffle
    Random,

    /// Smart shuffle (avoid the same artist back-to-back)
    Smart,
}

/// Read model exposed to presentation
///
/// Recomputed on demand from controller state; see
/// [`PlaybackController::snapshot`](crate::PlaybackController::snapshot).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub volume: u8,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub state: PlaybackState,
}
