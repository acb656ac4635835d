//! Embedded external-platform backend
//!
//! Each load creates a fresh host container and platform player; dispose
//! destroys both. The platform pushes no time updates, so position is polled
//! while (and only while) the player reports it is playing.

use super::{known_duration, seconds_to_duration, BackendEvent, BackendSignal, EmbedPlayerState};
use super::{EmbedSignal, MediaBackend, SdkLoader, SignalSink};
use crate::error::{PlaybackError, Result};
use crate::timer::{Scheduler, TimerHandle, MIN_PERIOD};
use crate::types::{AudioSource, BackendKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Host page services needed by the embedded backend
pub trait EmbedHost {
    /// Insert the platform SDK script into the page
    fn inject_sdk_script(&mut self);

    /// Create an off-screen container element, returning its id
    fn create_container(&mut self) -> String;

    fn remove_container(&mut self, container_id: &str);

    /// Construct a platform player inside `container_id`
    ///
    /// The player's ready, state-change and error callbacks must be forwarded
    /// through `sink` as [`EmbedSignal`]s.
    fn create_player(
        &mut self,
        container_id: &str,
        video_id: &str,
        vars: &PlayerVars,
        sink: SignalSink,
    ) -> Result<Box<dyn EmbedPlayer>>;
}

/// Transport surface of one platform player instance
pub trait EmbedPlayer {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn seek_to(&mut self, seconds: f64);

    /// Volume on the platform's 0-100 scale
    fn set_volume(&mut self, level: u8);

    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn destroy(&mut self);
}

/// Player construction parameters
///
/// Audio-only usage: no autoplay, no visible controls, minimal branding,
/// inline playback on mobile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerVars {
    pub autoplay: bool,
    pub controls: bool,
    pub modest_branding: bool,
    pub related_videos: bool,
    pub plays_inline: bool,
    pub keyboard: bool,
}

impl Default for PlayerVars {
    fn default() -> Self {
        Self {
            autoplay: false,
            controls: false,
            modest_branding: true,
            related_videos: false,
            plays_inline: true,
            keyboard: false,
        }
    }
}

impl PlayerVars {
    /// Parameters under the platform's own names, as 0/1 flags
    pub fn as_params(&self) -> Vec<(&'static str, u8)> {
        vec![
            ("autoplay", u8::from(self.autoplay)),
            ("controls", u8::from(self.controls)),
            ("modestbranding", u8::from(self.modest_branding)),
            ("rel", u8::from(self.related_videos)),
            ("playsinline", u8::from(self.plays_inline)),
            ("disablekb", u8::from(!self.keyboard)),
        ]
    }
}

struct ActivePlayer {
    container_id: String,
    player: Box<dyn EmbedPlayer>,
}

/// Backend for [`AudioSource::Embedded`] tracks
pub struct EmbeddedBackend<H: EmbedHost> {
    host: H,
    loader: Arc<SdkLoader>,
    scheduler: Arc<dyn Scheduler>,
    poll_interval: Duration,
    sink: Option<SignalSink>,
    /// Video waiting for the SDK before a player can be built
    pending_video: Option<String>,
    active: Option<ActivePlayer>,
    poll: Option<TimerHandle>,
    ready: bool,
    wants_playing: bool,
    volume: u8,
}

impl<H: EmbedHost> EmbeddedBackend<H> {
    pub fn new(
        host: H,
        loader: Arc<SdkLoader>,
        scheduler: Arc<dyn Scheduler>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            host,
            loader,
            scheduler,
            poll_interval: poll_interval.max(MIN_PERIOD),
            sink: None,
            pending_video: None,
            active: None,
            poll: None,
            ready: false,
            wants_playing: false,
            volume: 100,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Whether the position poll is running
    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    fn build_player(&mut self, video_id: &str) -> Result<()> {
        let Some(sink) = self.sink.clone() else {
            return Ok(());
        };

        let container_id = self.host.create_container();
        match self
            .host
            .create_player(&container_id, video_id, &PlayerVars::default(), sink)
        {
            Ok(player) => {
                debug!(video_id = %video_id, container = %container_id, "Embedded player created");
                self.active = Some(ActivePlayer {
                    container_id,
                    player,
                });
                Ok(())
            }
            Err(e) => {
                self.host.remove_container(&container_id);
                Err(e)
            }
        }
    }

    fn teardown(&mut self) {
        self.stop_polling();
        if let Some(mut active) = self.active.take() {
            active.player.destroy();
            self.host.remove_container(&active.container_id);
        }
    }

    fn start_polling(&mut self) {
        if self.poll.is_some() {
            return;
        }
        if let Some(sink) = self.sink.clone() {
            self.poll = Some(self.scheduler.every(
                self.poll_interval,
                sink,
                BackendSignal::Embed(EmbedSignal::PollTick),
            ));
        }
    }

    fn stop_polling(&mut self) {
        self.poll = None;
    }

    fn duration_event(&self) -> Option<BackendEvent> {
        let active = self.active.as_ref()?;
        known_duration(active.player.duration()).map(BackendEvent::DurationChanged)
    }

    fn on_embed(&mut self, signal: EmbedSignal) -> Vec<BackendEvent> {
        match signal {
            EmbedSignal::SdkReady => {
                let Some(video_id) = self.pending_video.take() else {
                    return Vec::new();
                };
                match self.build_player(&video_id) {
                    Ok(()) => Vec::new(),
                    Err(e) => {
                        self.wants_playing = false;
                        vec![BackendEvent::Failed(e)]
                    }
                }
            }
            EmbedSignal::PlayerReady => {
                let Some(active) = self.active.as_mut() else {
                    return Vec::new();
                };
                self.ready = true;
                active.player.set_volume(self.volume);
                if self.wants_playing {
                    active.player.play_video();
                }

                let mut events = vec![BackendEvent::Ready];
                events.extend(self.duration_event());
                events
            }
            EmbedSignal::StateChanged(state) => self.on_state(state),
            EmbedSignal::PollTick => {
                if self.poll.is_none() {
                    return Vec::new();
                }
                self.active
                    .as_ref()
                    .and_then(|active| seconds_to_duration(active.player.current_time()))
                    .map(BackendEvent::TimeUpdate)
                    .into_iter()
                    .collect()
            }
            EmbedSignal::Error(code) => {
                warn!(code, "Embedded player error");
                self.stop_polling();
                self.wants_playing = false;
                vec![BackendEvent::Failed(PlaybackError::EmbeddedPlayer(code))]
            }
        }
    }

    fn on_state(&mut self, state: EmbedPlayerState) -> Vec<BackendEvent> {
        match state {
            EmbedPlayerState::Playing => {
                self.start_polling();
                let mut events: Vec<BackendEvent> = self.duration_event().into_iter().collect();
                events.push(BackendEvent::PlayStateChanged(true));
                events
            }
            EmbedPlayerState::Paused => {
                self.stop_polling();
                vec![BackendEvent::PlayStateChanged(false)]
            }
            EmbedPlayerState::Ended => {
                self.stop_polling();
                self.wants_playing = false;
                vec![BackendEvent::Ended]
            }
            EmbedPlayerState::Buffering | EmbedPlayerState::Cued | EmbedPlayerState::Unstarted => {
                self.stop_polling();
                Vec::new()
            }
        }
    }
}

impl<H: EmbedHost> MediaBackend for EmbeddedBackend<H> {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn load(&mut self, source: &AudioSource, sink: SignalSink) -> Result<()> {
        let AudioSource::Embedded(video_id) = source else {
            return Err(PlaybackError::UnsupportedSource {
                backend: BackendKind::Embedded.label(),
                source_kind: source.label(),
            });
        };

        self.teardown();
        self.ready = false;
        self.wants_playing = false;
        self.pending_video = None;
        self.sink = Some(sink.clone());

        debug!(video_id = %video_id, generation = sink.generation(), "Loading embedded source");

        if self.loader.request(&sink, || self.host.inject_sdk_script()) {
            self.build_player(video_id)
        } else {
            debug!(video_id = %video_id, "Waiting for embedded platform SDK");
            self.pending_video = Some(video_id.clone());
            Ok(())
        }
    }

    fn play(&mut self) {
        self.wants_playing = true;
        if self.ready {
            if let Some(active) = self.active.as_mut() {
                active.player.play_video();
            }
        }
    }

    fn pause(&mut self) {
        self.wants_playing = false;
        if self.ready {
            if let Some(active) = self.active.as_mut() {
                active.player.pause_video();
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        if !self.ready {
            debug!(?position, "Ignoring seek before embedded player ready");
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.player.seek_to(position.as_secs_f64());
        }
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level.min(100);
        if self.ready {
            if let Some(active) = self.active.as_mut() {
                active.player.set_volume(self.volume);
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn on_signal(&mut self, signal: BackendSignal) -> Vec<BackendEvent> {
        if self.sink.is_none() {
            trace!(?signal, "Embedded backend not loaded, ignoring signal");
            return Vec::new();
        }

        match signal {
            BackendSignal::Embed(signal) => self.on_embed(signal),
            other => {
                trace!(signal = ?other, "Embedded backend ignoring foreign signal");
                Vec::new()
            }
        }
    }

    fn dispose(&mut self) {
        self.teardown();
        self.sink = None;
        self.pending_video = None;
        self.ready = false;
        self.wants_playing = false;
    }
}
