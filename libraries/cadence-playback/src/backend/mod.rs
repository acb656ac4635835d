//! Backend media adapters
//!
//! A backend wraps one playback technology behind [`MediaBackend`]. Hosts
//! deliver raw platform notifications as [`BackendSignal`]s through the
//! [`SignalSink`] handed to the backend at load time. The controller drains
//! them on its own turn, drops any whose generation is no longer active, and
//! lets the owning backend translate the rest into [`BackendEvent`]s.
//!
//! ```text
//! host element / SDK ──signal──▶ channel ──▶ PlaybackController::pump
//!                                              │ generation check
//!                                              ▼
//!                                   MediaBackend::on_signal ──▶ BackendEvent
//! ```

mod direct;
mod embedded;
mod sdk;

pub use direct::{DirectBackend, MediaElement};
pub use embedded::{EmbedHost, EmbedPlayer, EmbeddedBackend, PlayerVars};
pub use sdk::SdkLoader;

use crate::error::{PlaybackError, Result};
use crate::types::{AudioSource, BackendKind};
use crossbeam_channel::Sender;
use std::time::Duration;

/// Load generation
///
/// Every `load` gets a fresh generation; signals carry the generation of the
/// sink they were sent through.
pub type Generation = u64;

/// Raw notification from a host element, SDK or timer
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSignal {
    /// Native media element notification
    Element(ElementSignal),

    /// Embedded platform notification
    Embed(EmbedSignal),

    /// The controller's readiness watchdog expired
    LoadTimedOut,
}

/// Native media element notifications
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSignal {
    /// Metadata (and therefore duration) is available
    MetadataLoaded,

    /// The element's duration changed
    DurationChanged,

    /// Continuous time report while playing
    TimeUpdate,

    /// Playback actually started
    Playing,

    /// Playback paused
    Paused,

    /// Reached the end of the media
    Ended,

    /// `play()` was refused by the host (e.g. autoplay policy)
    PlayRejected(String),

    /// Decode or network failure
    Error(String),
}

/// Embedded platform notifications
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedSignal {
    /// The platform SDK finished loading
    SdkReady,

    /// The player instance is ready for commands
    PlayerReady,

    /// Player state changed
    StateChanged(EmbedPlayerState),

    /// Time polling interval elapsed
    PollTick,

    /// Player reported an error code
    Error(i32),
}

/// Player states reported by the embedded platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EmbedPlayerState {
    /// Map the platform's numeric state code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// A signal tagged with the generation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: Generation,
    pub signal: BackendSignal,
}

/// Sending half of the controller's signal queue, bound to one generation
#[derive(Debug, Clone)]
pub struct SignalSink {
    generation: Generation,
    tx: Sender<Envelope>,
}

impl SignalSink {
    pub fn new(generation: Generation, tx: Sender<Envelope>) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink tags signals with
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Queue a signal for the controller
    ///
    /// Returns `false` once the controller is gone.
    pub fn emit(&self, signal: BackendSignal) -> bool {
        self.tx
            .send(Envelope {
                generation: self.generation,
                signal,
            })
            .is_ok()
    }

    /// Queue a native element notification
    pub fn element(&self, signal: ElementSignal) -> bool {
        self.emit(BackendSignal::Element(signal))
    }

    /// Queue an embedded platform notification
    pub fn embed(&self, signal: EmbedSignal) -> bool {
        self.emit(BackendSignal::Embed(signal))
    }
}

/// What a backend reports after interpreting a signal
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Fires once per load; transport commands now take effect
    Ready,

    /// Authoritative duration became known or changed
    DurationChanged(Duration),

    /// Current playback position
    TimeUpdate(Duration),

    /// The platform started or stopped playing
    PlayStateChanged(bool),

    /// Reached the end of the track
    Ended,

    /// Load or playback failure
    Failed(PlaybackError),
}

/// Uniform contract over one playback technology
///
/// Backends are passive: they never decide what plays next and will keep
/// running until `dispose` is called. The controller guarantees only one
/// backend is active at a time.
pub trait MediaBackend {
    /// Which sources this backend plays
    fn kind(&self) -> BackendKind;

    /// Begin preparing `source`; never starts playback by itself
    ///
    /// Every later signal for this load must be sent through `sink`.
    fn load(&mut self, source: &AudioSource, sink: SignalSink) -> Result<()>;

    /// Request playback; stored until ready
    fn play(&mut self);

    /// Request pause; stored until ready
    fn pause(&mut self);

    /// Jump to `position`; ignored before ready
    fn seek(&mut self, position: Duration);

    /// Output volume (0-100); stored until ready
    fn set_volume(&mut self, level: u8);

    /// Whether the current load has signalled ready
    fn is_ready(&self) -> bool;

    /// Interpret a signal belonging to the current load
    fn on_signal(&mut self, signal: BackendSignal) -> Vec<BackendEvent>;

    /// Stop timers and detach or destroy the underlying player
    fn dispose(&mut self);
}

/// Convert a platform time value in seconds
///
/// Platforms report `NaN` or infinity for unknown durations, and occasionally
/// tiny negative values around seeks.
pub fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() {
        Duration::try_from_secs_f64(seconds.max(0.0)).ok()
    } else {
        None
    }
}

/// Convert a platform duration value, treating zero as unknown
pub(crate) fn known_duration(seconds: f64) -> Option<Duration> {
    seconds_to_duration(seconds).filter(|d| !d.is_zero())
}
