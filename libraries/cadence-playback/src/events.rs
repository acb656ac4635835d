//! Playback Events
//!
//! Event-based notification for presentation. The controller queues events
//! as its state changes; the host drains them with
//! [`PlaybackController::drain_events`](crate::PlaybackController::drain_events)
//! and re-renders from [`PlaybackSnapshot`](crate::PlaybackSnapshot).

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state or playing intent changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
        /// Whether playback is requested
        is_playing: bool,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track, `None` once the queue is cleared
        track_id: Option<String>,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Position moved (time report from the backend or a seek)
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration
        duration_ms: u64,
    },

    /// Backend reported an authoritative duration
    DurationChanged {
        duration_ms: u64,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Queue changed (tracks added/removed/replaced)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Shuffle toggled
    ShuffleChanged {
        enabled: bool,
    },

    /// Repeat toggled
    RepeatChanged {
        enabled: bool,
    },

    /// Backend failure absorbed by the controller
    Error {
        /// ID of the track that failed, if any
        track_id: Option<String>,
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Event name, handy for host-side dispatch and logs
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackEvent::StateChanged { .. } => "state_changed",
            PlaybackEvent::TrackChanged { .. } => "track_changed",
            PlaybackEvent::PositionUpdate { .. } => "position_update",
            PlaybackEvent::DurationChanged { .. } => "duration_changed",
            PlaybackEvent::TrackFinished { .. } => "track_finished",
            PlaybackEvent::VolumeChanged { .. } => "volume_changed",
            PlaybackEvent::QueueChanged { .. } => "queue_changed",
            PlaybackEvent::ShuffleChanged { .. } => "shuffle_changed",
            PlaybackEvent::RepeatChanged { .. } => "repeat_changed",
            PlaybackEvent::Error { .. } => "error",
        }
    }
}
