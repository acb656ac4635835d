//! Browser bindings for cadence-playback
//!
//! Provides a [`MediaElement`](crate::MediaElement) over an
//! `HTMLAudioElement`, so the direct backend can run in the page, and a
//! [`Scheduler`](crate::Scheduler) over the page's timers for embedded
//! polling and the load watchdog.
//!
//! Hosts call [`PlaybackController::pump`](crate::PlaybackController::pump)
//! from their own event loop (e.g. after each element event or timer tick).

mod element;
mod timer;

pub use element::WebAudioElement;
pub use timer::WebScheduler;
