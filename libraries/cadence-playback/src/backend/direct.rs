//! Direct-URL backend over a native media element

use super::{known_duration, seconds_to_duration, BackendEvent, BackendSignal, ElementSignal};
use super::{MediaBackend, SignalSink};
use crate::error::{PlaybackError, Result};
use crate::types::{AudioSource, BackendKind};
use std::time::Duration;
use tracing::{debug, trace};

/// Host media element the direct backend drives
///
/// One element is created up front and reused for every direct track. The
/// host forwards the element's native events as [`ElementSignal`]s through
/// whichever sink was last passed to [`bind`](MediaElement::bind).
pub trait MediaElement {
    /// Route native events through `sink` from now on
    fn bind(&mut self, sink: SignalSink);

    /// Stop routing native events
    fn unbind(&mut self);

    fn set_source(&mut self, url: &str);

    /// Detach the current source so the element stops fetching
    fn clear_source(&mut self);

    /// Start playback; a refusal is reported as [`ElementSignal::PlayRejected`]
    fn play(&mut self);

    fn pause(&mut self);

    fn set_current_time(&mut self, seconds: f64);

    fn current_time(&self) -> f64;

    /// Media duration in seconds, `NaN` until metadata has loaded
    fn duration(&self) -> f64;

    /// Output volume as a 0.0-1.0 fraction
    fn set_volume(&mut self, fraction: f64);
}

/// Backend for [`AudioSource::Direct`] tracks
#[derive(Debug)]
pub struct DirectBackend<E: MediaElement> {
    element: E,
    loaded: bool,
    ready: bool,
    wants_playing: bool,
    volume: u8,
    duration: Option<Duration>,
}

impl<E: MediaElement> DirectBackend<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            loaded: false,
            ready: false,
            wants_playing: false,
            volume: 100,
            duration: None,
        }
    }

    /// The wrapped element
    pub fn element(&self) -> &E {
        &self.element
    }

    fn apply_volume(&mut self) {
        self.element.set_volume(f64::from(self.volume) / 100.0);
    }

    /// Re-read the element's duration, returning it if it changed
    fn capture_duration(&mut self) -> Option<Duration> {
        let duration = known_duration(self.element.duration())?;
        if self.duration == Some(duration) {
            return None;
        }
        self.duration = Some(duration);
        Some(duration)
    }

    fn on_element(&mut self, signal: ElementSignal) -> Vec<BackendEvent> {
        let mut events = Vec::new();

        // The element is shared across loads and dispatches natively queued
        // events late. Until the new source reports metadata, playback events
        // can only come from the previous source.
        if !self.ready
            && matches!(
                signal,
                ElementSignal::Playing
                    | ElementSignal::Paused
                    | ElementSignal::TimeUpdate
                    | ElementSignal::Ended
            )
        {
            trace!(?signal, "Direct backend not ready, dropping playback event");
            return events;
        }

        match signal {
            ElementSignal::MetadataLoaded => {
                events.extend(self.capture_duration().map(BackendEvent::DurationChanged));
                if !self.ready {
                    self.ready = true;
                    self.apply_volume();
                    if self.wants_playing {
                        self.element.play();
                    }
                    events.push(BackendEvent::Ready);
                }
            }
            ElementSignal::DurationChanged => {
                events.extend(self.capture_duration().map(BackendEvent::DurationChanged));
            }
            ElementSignal::TimeUpdate => {
                events.extend(
                    seconds_to_duration(self.element.current_time()).map(BackendEvent::TimeUpdate),
                );
            }
            ElementSignal::Playing => {
                // Some streams only report a duration once playback begins
                events.extend(self.capture_duration().map(BackendEvent::DurationChanged));
                events.push(BackendEvent::PlayStateChanged(true));
            }
            ElementSignal::Paused => events.push(BackendEvent::PlayStateChanged(false)),
            ElementSignal::Ended => {
                self.wants_playing = false;
                events.push(BackendEvent::Ended);
            }
            ElementSignal::PlayRejected(reason) => {
                self.wants_playing = false;
                events.push(BackendEvent::Failed(PlaybackError::PlaybackRejected(reason)));
            }
            ElementSignal::Error(reason) => {
                self.wants_playing = false;
                events.push(BackendEvent::Failed(PlaybackError::Media(reason)));
            }
        }

        events
    }
}

impl<E: MediaElement> MediaBackend for DirectBackend<E> {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }

    fn load(&mut self, source: &AudioSource, sink: SignalSink) -> Result<()> {
        let AudioSource::Direct(url) = source else {
            return Err(PlaybackError::UnsupportedSource {
                backend: BackendKind::Direct.label(),
                source_kind: source.label(),
            });
        };

        debug!(url = %url, generation = sink.generation(), "Loading direct source");

        self.element.pause();
        self.element.bind(sink);
        self.element.set_source(url);
        self.loaded = true;
        self.ready = false;
        self.wants_playing = false;
        self.duration = None;
        self.apply_volume();

        Ok(())
    }

    fn play(&mut self) {
        self.wants_playing = true;
        if self.ready {
            self.element.play();
        }
    }

    fn pause(&mut self) {
        self.wants_playing = false;
        if self.loaded {
            self.element.pause();
        }
    }

    fn seek(&mut self, position: Duration) {
        if !self.ready {
            debug!(?position, "Ignoring seek before metadata loaded");
            return;
        }
        self.element.set_current_time(position.as_secs_f64());
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level.min(100);
        if self.loaded {
            self.apply_volume();
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn on_signal(&mut self, signal: BackendSignal) -> Vec<BackendEvent> {
        if !self.loaded {
            trace!(?signal, "Direct backend not loaded, ignoring signal");
            return Vec::new();
        }

        match signal {
            BackendSignal::Element(signal) => self.on_element(signal),
            other => {
                trace!(signal = ?other, "Direct backend ignoring foreign signal");
                Vec::new()
            }
        }
    }

    fn dispose(&mut self) {
        if self.loaded {
            self.element.pause();
            self.element.clear_source();
            self.element.unbind();
        }
        self.loaded = false;
        self.ready = false;
        self.wants_playing = false;
        self.duration = None;
    }
}
