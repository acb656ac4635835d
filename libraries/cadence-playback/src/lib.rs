//! Cadence - Playback Control
//!
//! Client-side playback and queue controller for the Cadence web player.
//!
//! This crate provides:
//! - A play queue with next/previous resolution, shuffle and repeat
//! - Two interchangeable media backends behind one [`MediaBackend`] contract
//!   (direct media URLs and an embedded external-platform player)
//! - Volume and mute that survive backend switches
//! - Stale-event safe backend switching
//! - Once-per-session stream analytics
//!
//! # Architecture
//!
//! `cadence-playback` does not touch the DOM or the network itself. Hosts
//! provide the platform pieces through traits:
//! - [`MediaElement`] for the native media element
//! - [`EmbedHost`] / [`EmbedPlayer`] for the embedded platform SDK
//! - [`StreamCounter`] for the "stream started" endpoint
//!
//! Platform notifications flow back as signals tagged with the load
//! generation they belong to. The host calls
//! [`PlaybackController::pump`] to apply them, then re-renders from
//! [`PlaybackController::snapshot`] and
//! [`PlaybackController::drain_events`].
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_playback::{
//!     AudioSource, Backends, DirectBackend, EmbedHost, EmbedPlayer, EmbeddedBackend,
//!     MediaElement, PlaybackConfig, PlaybackController, PlaybackState, PlayerVars,
//!     Result, SdkLoader, SignalSink, TokioScheduler, Track,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # struct Element;
//! # impl MediaElement for Element {
//! #     fn bind(&mut self, _: SignalSink) {}
//! #     fn unbind(&mut self) {}
//! #     fn set_source(&mut self, _: &str) {}
//! #     fn clear_source(&mut self) {}
//! #     fn play(&mut self) {}
//! #     fn pause(&mut self) {}
//! #     fn set_current_time(&mut self, _: f64) {}
//! #     fn current_time(&self) -> f64 { 0.0 }
//! #     fn duration(&self) -> f64 { f64::NAN }
//! #     fn set_volume(&mut self, _: f64) {}
//! # }
//! # struct Host;
//! # impl EmbedHost for Host {
//! #     fn inject_sdk_script(&mut self) {}
//! #     fn create_container(&mut self) -> String { "embed".into() }
//! #     fn remove_container(&mut self, _: &str) {}
//! #     fn create_player(&mut self, _: &str, _: &str, _: &PlayerVars, _: SignalSink)
//! #         -> Result<Box<dyn EmbedPlayer>> { unimplemented!() }
//! # }
//! # fn main() -> Result<()> {
//! let config = PlaybackConfig::default();
//! let backends = Backends::new(
//!     DirectBackend::new(Element),
//!     EmbeddedBackend::new(
//!         Host,
//!         SdkLoader::global(),
//!         Arc::new(TokioScheduler),
//!         config.poll_interval(),
//!     ),
//! )?;
//! let mut controller = PlaybackController::new(config, backends);
//!
//! let track = Track::new(
//!     "song-1",
//!     "My Song",
//!     "Artist Name",
//!     Duration::from_secs(180),
//!     AudioSource::Direct("https://cdn.example.com/song-1.mp3".to_string()),
//! );
//!
//! controller.play_track(track);
//! assert_eq!(controller.state(), PlaybackState::Loading);
//! assert!(controller.is_playing());
//!
//! // Platform events arrive asynchronously
//! controller.pump();
//! for event in controller.drain_events() {
//!     println!("{}", event.name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use cadence_playback::{Queue, ShuffleStrategy, Track, AudioSource};
//! use std::time::Duration;
//!
//! let tracks: Vec<Track> = (0..5)
//!     .map(|i| {
//!         Track::new(
//!             i.to_string(),
//!             format!("Track {i}"),
//!             "Artist",
//!             Duration::from_secs(200),
//!             AudioSource::Embedded(format!("video{i}")),
//!         )
//!     })
//!     .collect();
//!
//! let mut queue = Queue::with_strategy(ShuffleStrategy::Smart);
//! queue.replace(tracks, 2);
//! queue.set_shuffle(true);
//!
//! // The current entry stays current
//! assert_eq!(queue.current().unwrap().id, "2");
//! // With repeat, resolution never runs out
//! assert!(queue.resolve_next(true).is_some());
//! ```

mod backend;
mod config;
mod controller;
mod error;
mod events;
mod queue;
mod session;
mod shuffle;
mod timer;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use backend::{
    seconds_to_duration, BackendEvent, BackendSignal, DirectBackend, ElementSignal, EmbedHost,
    EmbedPlayer, EmbedPlayerState, EmbedSignal, EmbeddedBackend, Envelope, Generation,
    MediaBackend, MediaElement, PlayerVars, SdkLoader, SignalSink,
};
pub use config::PlaybackConfig;
pub use controller::{Backends, PlaybackController};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::{Queue, RemovedTrack};
pub use session::{BoxError, SessionTracker, StreamCounter};
pub use shuffle::shuffled_order;
pub use timer::{default_scheduler, Scheduler, TimerHandle, TokioScheduler, MIN_PERIOD};
pub use types::{
    AudioSource, BackendKind, LyricLine, PlaybackSnapshot, PlaybackState, ShuffleStrategy, Track,
};
pub use volume::Volume;
