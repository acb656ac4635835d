//! Error types for playback management

use std::time::Duration;
use thiserror::Error;

/// Playback errors
///
/// None of these escape the controller's public transport API. They are
/// logged, reflected as `is_playing = false` and reported through
/// [`PlaybackEvent::Error`](crate::PlaybackEvent::Error).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// A backend was asked to load a source kind it cannot play
    #[error("Unsupported source for {backend} backend: {source_kind}")]
    UnsupportedSource {
        backend: &'static str,
        source_kind: &'static str,
    },

    /// The host refused to start playback (e.g. autoplay policy)
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// Decode or network failure reported by the media element
    #[error("Media error: {0}")]
    Media(String),

    /// The embedded platform SDK failed to construct a player
    #[error("Embedded player construction failed: {0}")]
    PlayerConstruction(String),

    /// The embedded platform player reported an error code
    #[error("Embedded player error code {0}")]
    EmbeddedPlayer(i32),

    /// A backend never became ready
    #[error("Backend not ready after {0:?}")]
    LoadTimeout(Duration),

    /// A backend was registered in the wrong slot
    #[error("Expected a {expected} backend, got {actual}")]
    BackendMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
