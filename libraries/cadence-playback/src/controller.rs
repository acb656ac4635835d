//! Playback controller - core orchestration
//!
//! Single source of truth for what is playing. Coordinates the queue, the two
//! media backends, volume, shuffle/repeat and stream analytics.
//!
//! The controller never blocks or awaits. Backends report through signals
//! that the host drains with [`PlaybackController::pump`]. Timers come from a
//! [`Scheduler`] and the stream counter runs on the ambient async runtime.

use crate::{
    backend::{BackendEvent, BackendSignal, Envelope, Generation, MediaBackend, SignalSink},
    config::PlaybackConfig,
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    queue::Queue,
    session::SessionTracker,
    timer::{default_scheduler, Scheduler, TimerHandle},
    types::{BackendKind, LyricLine, PlaybackSnapshot, PlaybackState, Track},
    volume::Volume,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// One backend per [`BackendKind`]
pub struct Backends {
    direct: Box<dyn MediaBackend>,
    embedded: Box<dyn MediaBackend>,
}

impl Backends {
    /// Pair a direct and an embedded backend
    ///
    /// Fails if either backend reports the other kind.
    pub fn new(
        direct: impl MediaBackend + 'static,
        embedded: impl MediaBackend + 'static,
    ) -> Result<Self> {
        expect_kind(&direct, BackendKind::Direct)?;
        expect_kind(&embedded, BackendKind::Embedded)?;
        Ok(Self {
            direct: Box::new(direct),
            embedded: Box::new(embedded),
        })
    }

    fn get_mut(&mut self, kind: BackendKind) -> &mut dyn MediaBackend {
        match kind {
            BackendKind::Direct => self.direct.as_mut(),
            BackendKind::Embedded => self.embedded.as_mut(),
        }
    }
}

fn expect_kind(backend: &dyn MediaBackend, expected: BackendKind) -> Result<()> {
    if backend.kind() == expected {
        Ok(())
    } else {
        Err(PlaybackError::BackendMismatch {
            expected: expected.label(),
            actual: backend.kind().label(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveBackend {
    kind: BackendKind,
    generation: Generation,
}

/// Playback controller
pub struct PlaybackController {
    config: PlaybackConfig,

    // Observable state
    state: PlaybackState,
    current_track: Option<Track>,
    is_playing: bool,
    position: Duration,
    duration: Duration,
    volume: Volume,
    shuffle: bool,
    repeat: bool,

    queue: Queue,

    // Backend switching
    backends: Backends,
    active: Option<ActiveBackend>,
    backend_ready: bool,
    next_generation: Generation,
    signal_tx: Sender<Envelope>,
    signal_rx: Receiver<Envelope>,

    scheduler: Arc<dyn Scheduler>,
    // Readiness watchdog for the active load
    watchdog: Option<TimerHandle>,

    tracker: SessionTracker,

    // Event queue for presentation
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Create a controller with nothing loaded
    ///
    /// A config that fails [`PlaybackConfig::validate`] is repaired with
    /// [`PlaybackConfig::sanitized`].
    pub fn new(config: PlaybackConfig, backends: Backends) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "Invalid playback config, repairing");
                config.sanitized()
            }
        };
        let (signal_tx, signal_rx) = unbounded();

        let mut queue = Queue::with_strategy(config.shuffle_strategy);
        queue.set_shuffle(config.shuffle);

        Self {
            state: PlaybackState::Idle,
            current_track: None,
            is_playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: Volume::new(config.volume),
            shuffle: config.shuffle,
            repeat: config.repeat,
            queue,
            backends,
            active: None,
            backend_ready: false,
            next_generation: 1,
            signal_tx,
            signal_rx,
            scheduler: default_scheduler(),
            watchdog: None,
            tracker: SessionTracker::disabled(),
            pending_events: Vec::new(),
            config,
        }
    }

    /// Report listening sessions through `tracker`
    #[must_use]
    pub fn with_session_tracker(mut self, tracker: SessionTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Use `scheduler` for the readiness watchdog
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    // ===== Playback Control =====

    /// Play `track` now, enqueueing it if it is not queued yet
    pub fn play_track(&mut self, track: Track) {
        let index = match self.queue.position_of(&track.id) {
            Some(index) => index,
            None => {
                self.queue.enqueue(track.clone());
                self.emit_queue_changed();
                self.queue.len() - 1
            }
        };

        self.queue.set_current(index);
        self.start_track(track);
    }

    /// Replace the queue with `tracks` and play from `start_index`
    ///
    /// An empty list leaves everything untouched.
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let Some(index) = self.queue.replace(tracks, start_index) else {
            debug!("Ignoring play_queue with no tracks");
            return;
        };

        self.emit_queue_changed();
        self.play_index(index);
    }

    /// Pause if playing, otherwise play
    pub fn toggle_play_pause(&mut self) {
        if self.is_playing && self.state != PlaybackState::Idle {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Start or resume playback
    ///
    /// With nothing loaded, starts the queue from its first entry. After the
    /// queue ran out (or the track failed before it became ready) the current
    /// track is restarted from the beginning.
    pub fn play(&mut self) {
        if self.current_track.is_none() {
            match self.queue.resolve_next(false) {
                Some(index) => self.play_index(index),
                None => debug!("Nothing to play"),
            }
            return;
        }

        if self.needs_restart() {
            if let Some(track) = self.current_track.clone() {
                self.start_track(track);
            }
            return;
        }

        if self.is_playing {
            return;
        }

        self.is_playing = true;
        if let Some(backend) = self.active_backend_mut() {
            backend.play();
        }
        if self.backend_ready {
            self.state = PlaybackState::Playing;
        }
        self.emit_state_changed();
        self.sync_session();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }

        self.is_playing = false;
        if let Some(backend) = self.active_backend_mut() {
            backend.pause();
        }
        if self.backend_ready {
            self.state = PlaybackState::Paused;
        }
        self.emit_state_changed();
    }

    /// Skip to next track
    ///
    /// Past the last entry without repeat, playback stops and the state goes
    /// idle; the current track stays selected.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.queue.is_empty() {
            debug!("Ignoring next on empty queue");
            return;
        }
        self.advance();
    }

    /// Go to previous track (clamped at the first entry)
    pub fn previous(&mut self) {
        if self.queue.is_empty() {
            debug!("Ignoring previous on empty queue");
            return;
        }

        if let Some(threshold) = self.config.previous_restart_threshold() {
            if self.current_track.is_some() && self.position > threshold {
                self.seek_to(Duration::ZERO);
                self.play();
                return;
            }
        }

        if let Some(index) = self.queue.resolve_previous() {
            self.play_index(index);
        }
    }

    /// Stop the active backend; the queue and current track are kept
    ///
    /// Call before tearing down the host page.
    pub fn shutdown(&mut self) {
        self.teardown_active();
        self.backend_ready = false;
        if self.is_playing || self.state != PlaybackState::Idle {
            self.is_playing = false;
            self.state = PlaybackState::Idle;
            self.emit_state_changed();
        }
    }

    // ===== Seek =====

    /// Seek in the current track
    ///
    /// The position is updated immediately and clamped to the known duration.
    pub fn seek_to(&mut self, position: Duration) {
        if self.current_track.is_none() {
            debug!("Ignoring seek with no track loaded");
            return;
        }

        let target = if self.duration.is_zero() {
            position
        } else {
            position.min(self.duration)
        };

        self.position = target;
        if let Some(backend) = self.active_backend_mut() {
            backend.seek(target);
        }
        self.emit_position_update();
    }

    // ===== Volume =====

    /// Set volume (0-100, clamped)
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.push_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.push_volume();
    }

    fn push_volume(&mut self) {
        let level = self.volume.effective_level();
        if let Some(backend) = self.active_backend_mut() {
            backend.set_volume(level);
        }
        self.emit(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    // ===== Shuffle & Repeat =====

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.queue.set_shuffle(self.shuffle);
        self.emit(PlaybackEvent::ShuffleChanged {
            enabled: self.shuffle,
        });
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
        self.emit(PlaybackEvent::RepeatChanged {
            enabled: self.repeat,
        });
    }

    // ===== Queue Management =====

    /// Append `track` unless its id is already queued
    ///
    /// Returns `true` if the track was added. Never changes what is playing.
    pub fn add_to_queue(&mut self, track: Track) -> bool {
        let added = self.queue.enqueue(track);
        if added {
            self.emit_queue_changed();
        }
        added
    }

    /// Remove the first queued entry with `track_id`
    ///
    /// Removing the current entry keeps it playing; `next` continues with the
    /// entry that followed it. Emptying the queue stops playback.
    pub fn remove_from_queue(&mut self, track_id: &str) -> bool {
        let Some(removed) = self.queue.remove_by_id(track_id) else {
            return false;
        };

        debug!(track_id = %track_id, was_current = removed.was_current, "Removed from queue");
        self.emit_queue_changed();

        if self.queue.is_empty() {
            self.reset();
        }
        true
    }

    /// Stop playback and empty the queue
    pub fn clear_queue(&mut self) {
        self.reset();
        self.queue.clear();
        self.emit_queue_changed();
    }

    // ===== Backend Signals =====

    /// Process every queued backend signal
    ///
    /// Hosts call this whenever they delivered signals (or on a fixed tick).
    /// Returns the number of signals taken off the queue.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.signal_rx.try_recv() {
            self.handle_signal(envelope);
            handled += 1;
        }
        handled
    }

    /// Whether signals are waiting for [`pump`](Self::pump)
    pub fn has_pending_signals(&self) -> bool {
        !self.signal_rx.is_empty()
    }

    /// Process a single signal
    ///
    /// Signals from any generation other than the active one are dropped.
    pub fn handle_signal(&mut self, envelope: Envelope) {
        let Some(active) = self.active else {
            trace!(generation = envelope.generation, "Dropping signal, no active backend");
            return;
        };

        if envelope.generation != active.generation {
            trace!(
                generation = envelope.generation,
                active = active.generation,
                signal = ?envelope.signal,
                "Dropping stale signal"
            );
            return;
        }

        if envelope.signal == BackendSignal::LoadTimedOut {
            self.on_load_timeout();
            return;
        }

        let events = self.backends.get_mut(active.kind).on_signal(envelope.signal);
        for event in events {
            // An earlier event may have switched tracks
            if self.active.map(|a| a.generation) != Some(active.generation) {
                break;
            }
            self.apply_backend_event(event);
        }
    }

    fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ready => {
                debug!(track_id = ?self.current_track_id(), "Backend ready");
                self.backend_ready = true;
                self.watchdog = None;
                self.state = if self.is_playing {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
                self.emit_state_changed();
            }
            BackendEvent::DurationChanged(duration) => {
                if duration != self.duration {
                    self.duration = duration;
                    self.emit(PlaybackEvent::DurationChanged {
                        duration_ms: as_millis(duration),
                    });
                }
            }
            BackendEvent::TimeUpdate(position) => {
                self.position = position;
                self.emit_position_update();
            }
            BackendEvent::PlayStateChanged(playing) => {
                // Late pause echo after the queue ran out
                if !playing && self.state == PlaybackState::Idle {
                    return;
                }
                self.is_playing = playing;
                if self.backend_ready {
                    self.state = if playing {
                        PlaybackState::Playing
                    } else {
                        PlaybackState::Paused
                    };
                }
                self.emit_state_changed();
                self.sync_session();
            }
            BackendEvent::Ended => {
                if let Some(track_id) = self.current_track_id() {
                    debug!(track_id = %track_id, "Track finished");
                    self.emit(PlaybackEvent::TrackFinished { track_id });
                }
                self.position = self.duration;
                self.advance();
            }
            BackendEvent::Failed(error) => self.fail(&error),
        }
    }

    fn on_load_timeout(&mut self) {
        self.watchdog = None;
        if self.backend_ready {
            return;
        }
        if let Some(timeout) = self.config.load_timeout() {
            self.fail(&PlaybackError::LoadTimeout(timeout));
        }
    }

    // ===== State Queries =====

    /// Read model for presentation
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track.clone(),
            is_playing: self.is_playing,
            position: self.position,
            duration: self.duration,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            state: self.state,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Whether playback is requested (not necessarily audible yet)
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn is_repeat(&self) -> bool {
        self.repeat
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Lyric line for the current position
    pub fn current_lyric(&self) -> Option<&LyricLine> {
        self.current_track.as_ref()?.lyric_at(self.position)
    }

    /// Kind of the backend currently loaded, if any
    pub fn active_backend(&self) -> Option<BackendKind> {
        self.active.map(|a| a.kind)
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn play_index(&mut self, index: usize) {
        let Some(track) = self.queue.set_current(index).cloned() else {
            warn!(index, "Queue index out of range");
            return;
        };
        self.start_track(track);
    }

    /// Resolve and play the next entry, or stop at the end of the queue
    fn advance(&mut self) {
        match self.queue.resolve_next(self.repeat) {
            Some(index) => self.play_index(index),
            None => self.stop_at_end(),
        }
    }

    /// Make `track` current and activate its backend with play intent
    fn start_track(&mut self, track: Track) {
        self.teardown_active();

        let previous_track_id = self.current_track_id();
        let generation = self.next_generation;
        self.next_generation += 1;
        let kind = track.backend_kind();

        debug!(
            track_id = %track.id,
            backend = kind.label(),
            generation,
            "Starting track"
        );

        self.position = Duration::ZERO;
        self.duration = track.duration_hint;
        self.is_playing = true;
        self.backend_ready = false;
        self.state = PlaybackState::Loading;
        self.active = Some(ActiveBackend { kind, generation });

        let source = track.audio_source.clone();
        self.emit(PlaybackEvent::TrackChanged {
            track_id: Some(track.id.clone()),
            previous_track_id,
        });
        self.current_track = Some(track);
        self.emit_state_changed();

        let sink = SignalSink::new(generation, self.signal_tx.clone());
        let volume = self.volume.effective_level();
        let backend = self.backends.get_mut(kind);
        match backend.load(&source, sink) {
            Ok(()) => {
                backend.set_volume(volume);
                backend.play();
                self.arm_watchdog(generation);
            }
            Err(e) => self.fail(&e),
        }

        self.sync_session();
    }

    fn arm_watchdog(&mut self, generation: Generation) {
        if let Some(timeout) = self.config.load_timeout() {
            let sink = SignalSink::new(generation, self.signal_tx.clone());
            self.watchdog = Some(
                self.scheduler
                    .after(timeout, sink, BackendSignal::LoadTimedOut),
            );
        }
    }

    /// Absorb a backend failure: stop, keep the track, tell presentation
    fn fail(&mut self, error: &PlaybackError) {
        let track_id = self.current_track_id();
        warn!(track_id = ?track_id, error = %error, "Playback failed");

        self.watchdog = None;
        self.is_playing = false;
        if let Some(backend) = self.active_backend_mut() {
            backend.pause();
        }
        self.state = PlaybackState::Paused;

        self.emit(PlaybackEvent::Error {
            track_id,
            message: error.to_string(),
        });
        self.emit_state_changed();
    }

    fn stop_at_end(&mut self) {
        debug!("Reached end of queue");
        self.watchdog = None;
        self.is_playing = false;
        if let Some(backend) = self.active_backend_mut() {
            backend.pause();
        }
        self.state = PlaybackState::Idle;
        self.emit_state_changed();
    }

    /// Dispose the backend and forget the current track
    fn reset(&mut self) {
        self.teardown_active();
        let previous_track_id = self.current_track_id();

        self.current_track = None;
        self.is_playing = false;
        self.backend_ready = false;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.state = PlaybackState::Idle;

        if previous_track_id.is_some() {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id,
            });
        }
        self.emit_state_changed();
    }

    fn teardown_active(&mut self) {
        self.watchdog = None;
        if let Some(active) = self.active.take() {
            trace!(
                generation = active.generation,
                backend = active.kind.label(),
                "Disposing backend"
            );
            self.backends.get_mut(active.kind).dispose();
        }
    }

    fn needs_restart(&self) -> bool {
        self.state == PlaybackState::Idle
            || self.active.is_none()
            || (!self.backend_ready && self.state == PlaybackState::Paused)
    }

    fn active_backend_mut(&mut self) -> Option<&mut dyn MediaBackend> {
        let kind = self.active?.kind;
        Some(self.backends.get_mut(kind))
    }

    fn current_track_id(&self) -> Option<String> {
        self.current_track.as_ref().map(|t| t.id.clone())
    }

    fn sync_session(&mut self) {
        self.tracker
            .observe(self.current_track.as_ref(), self.is_playing);
    }

    fn emit(&mut self, event: PlaybackEvent) {
        trace!(event = event.name(), "Playback event");
        self.pending_events.push(event);
    }

    fn emit_state_changed(&mut self) {
        self.emit(PlaybackEvent::StateChanged {
            state: self.state,
            is_playing: self.is_playing,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_position_update(&mut self) {
        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: as_millis(self.position),
            duration_ms: as_millis(self.duration),
        });
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown_active();
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
