//! Shared test doubles for controller integration tests
//!
//! Fakes stand in for the host page: a media element, an embedded platform
//! host/player pair, a manually driven scheduler and a recording stream
//! counter. Platform notifications are injected through the same sinks the
//! real host would use.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_playback::{
    AudioSource, BackendSignal, Backends, BoxError, DirectBackend, ElementSignal, EmbedHost,
    EmbedPlayer, EmbedPlayerState, EmbedSignal, EmbeddedBackend, MediaElement, PlaybackConfig,
    PlaybackController, PlayerVars, Result, Scheduler, SdkLoader, SessionTracker, SignalSink,
    StreamCounter, TimerHandle, Track,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Media element =====

#[derive(Debug, Default)]
pub struct ElementProbe {
    pub sink: Option<SignalSink>,
    pub source: Option<String>,
    pub playing: bool,
    pub play_calls: usize,
    pub time: f64,
    pub duration: f64,
    pub volume: f64,
    pub seeks: Vec<f64>,
    pub sources_loaded: usize,
}

pub struct FakeElement(pub Rc<RefCell<ElementProbe>>);

impl MediaElement for FakeElement {
    fn bind(&mut self, sink: SignalSink) {
        self.0.borrow_mut().sink = Some(sink);
    }
    fn unbind(&mut self) {
        self.0.borrow_mut().sink = None;
    }
    fn set_source(&mut self, url: &str) {
        let mut probe = self.0.borrow_mut();
        probe.source = Some(url.to_string());
        probe.duration = f64::NAN;
        probe.time = 0.0;
        probe.sources_loaded += 1;
    }
    fn clear_source(&mut self) {
        self.0.borrow_mut().source = None;
    }
    fn play(&mut self) {
        let mut probe = self.0.borrow_mut();
        probe.playing = true;
        probe.play_calls += 1;
    }
    fn pause(&mut self) {
        self.0.borrow_mut().playing = false;
    }
    fn set_current_time(&mut self, seconds: f64) {
        let mut probe = self.0.borrow_mut();
        probe.time = seconds;
        probe.seeks.push(seconds);
    }
    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }
    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }
    fn set_volume(&mut self, fraction: f64) {
        self.0.borrow_mut().volume = fraction;
    }
}

// ===== Embedded platform =====

#[derive(Debug)]
pub struct PlayerProbe {
    pub video_id: String,
    pub sink: SignalSink,
    pub plays: usize,
    pub pauses: usize,
    pub seeks: Vec<f64>,
    pub volume: Option<u8>,
    pub destroyed: bool,
    pub time: f64,
    pub duration: f64,
}

pub struct FakePlayer(Rc<RefCell<PlayerProbe>>);

impl EmbedPlayer for FakePlayer {
    fn play_video(&mut self) {
        self.0.borrow_mut().plays += 1;
    }
    fn pause_video(&mut self) {
        self.0.borrow_mut().pauses += 1;
    }
    fn seek_to(&mut self, seconds: f64) {
        self.0.borrow_mut().seeks.push(seconds);
    }
    fn set_volume(&mut self, level: u8) {
        self.0.borrow_mut().volume = Some(level);
    }
    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }
    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }
    fn destroy(&mut self) {
        self.0.borrow_mut().destroyed = true;
    }
}

#[derive(Debug, Default)]
pub struct HostProbe {
    pub injections: usize,
    pub containers: Vec<String>,
    pub players: Vec<Rc<RefCell<PlayerProbe>>>,
    pub next_container: usize,
}

pub struct FakeHost(pub Rc<RefCell<HostProbe>>);

impl EmbedHost for FakeHost {
    fn inject_sdk_script(&mut self) {
        self.0.borrow_mut().injections += 1;
    }
    fn create_container(&mut self) -> String {
        let mut probe = self.0.borrow_mut();
        probe.next_container += 1;
        let id = format!("cadence-embed-{}", probe.next_container);
        probe.containers.push(id.clone());
        id
    }
    fn remove_container(&mut self, container_id: &str) {
        self.0
            .borrow_mut()
            .containers
            .retain(|c| c != container_id);
    }
    fn create_player(
        &mut self,
        _container_id: &str,
        video_id: &str,
        _vars: &PlayerVars,
        sink: SignalSink,
    ) -> Result<Box<dyn EmbedPlayer>> {
        let player = Rc::new(RefCell::new(PlayerProbe {
            video_id: video_id.to_string(),
            sink,
            plays: 0,
            pauses: 0,
            seeks: Vec::new(),
            volume: None,
            destroyed: false,
            time: 0.0,
            duration: 0.0,
        }));
        self.0.borrow_mut().players.push(Rc::clone(&player));
        Ok(Box::new(FakePlayer(player)))
    }
}

// ===== Scheduler =====

struct ManualTimer {
    repeating: bool,
    sink: SignalSink,
    signal: BackendSignal,
    cancelled: Arc<AtomicBool>,
}

/// Scheduler whose timers only fire when the test says so
#[derive(Default)]
pub struct ManualScheduler {
    timers: Mutex<Vec<ManualTimer>>,
}

impl ManualScheduler {
    fn register(&self, repeating: bool, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.lock().unwrap().push(ManualTimer {
            repeating,
            sink,
            signal,
            cancelled: Arc::clone(&cancelled),
        });
        TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }

    fn live(&self, repeating: bool) -> usize {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.repeating == repeating && !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Number of running periodic timers
    pub fn live_periodic(&self) -> usize {
        self.live(true)
    }

    /// Number of pending one-shot timers
    pub fn live_one_shots(&self) -> usize {
        self.live(false)
    }

    /// Fire every running periodic timer once
    pub fn tick(&self) {
        for timer in self.timers.lock().unwrap().iter() {
            if timer.repeating && !timer.cancelled.load(Ordering::SeqCst) {
                timer.sink.emit(timer.signal.clone());
            }
        }
    }

    /// Expire every pending one-shot timer
    pub fn expire_one_shots(&self) {
        for timer in self.timers.lock().unwrap().iter() {
            if !timer.repeating && !timer.cancelled.swap(true, Ordering::SeqCst) {
                timer.sink.emit(timer.signal.clone());
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, _period: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        self.register(true, sink, signal)
    }

    fn after(&self, _delay: Duration, sink: SignalSink, signal: BackendSignal) -> TimerHandle {
        self.register(false, sink, signal)
    }
}

// ===== Stream counter =====

#[derive(Default)]
pub struct RecordingCounter {
    pub calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingCounter {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamCounter for RecordingCounter {
    async fn record_stream(&self, track_id: &str) -> std::result::Result<(), BoxError> {
        self.calls.lock().unwrap().push(track_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err("stream endpoint unavailable".into());
        }
        Ok(())
    }
}

// ===== Harness =====

pub struct Harness {
    pub controller: PlaybackController,
    pub element: Rc<RefCell<ElementProbe>>,
    pub host: Rc<RefCell<HostProbe>>,
    pub scheduler: Arc<ManualScheduler>,
    pub loader: Arc<SdkLoader>,
    pub counter: Arc<RecordingCounter>,
}

impl Harness {
    /// Default config with the embedded SDK already loaded
    pub fn new() -> Self {
        Self::build(PlaybackConfig::default(), true)
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        Self::build(config, true)
    }

    /// Embedded SDK not loaded yet
    pub fn with_cold_sdk() -> Self {
        Self::build(PlaybackConfig::default(), false)
    }

    fn build(config: PlaybackConfig, sdk_ready: bool) -> Self {
        let element = Rc::new(RefCell::new(ElementProbe::default()));
        let host = Rc::new(RefCell::new(HostProbe::default()));
        let scheduler = Arc::new(ManualScheduler::default());
        let loader = Arc::new(SdkLoader::new());
        let counter = Arc::new(RecordingCounter::default());

        if sdk_ready {
            loader.mark_ready();
        }

        let backends = Backends::new(
            DirectBackend::new(FakeElement(Rc::clone(&element))),
            EmbeddedBackend::new(
                FakeHost(Rc::clone(&host)),
                Arc::clone(&loader),
                scheduler.clone(),
                config.poll_interval(),
            ),
        )
        .expect("backend kinds match");

        let controller = PlaybackController::new(config, backends)
            .with_scheduler(scheduler.clone())
            .with_session_tracker(SessionTracker::new(counter.clone()));

        Self {
            controller,
            element,
            host,
            scheduler,
            loader,
            counter,
        }
    }

    pub fn pump(&mut self) -> usize {
        self.controller.pump()
    }

    // ----- direct element -----

    /// Sink the element is currently bound to
    pub fn element_sink(&self) -> SignalSink {
        self.element
            .borrow()
            .sink
            .clone()
            .expect("element is not bound")
    }

    /// Deliver a native element event and pump
    pub fn element_event(&mut self, signal: ElementSignal) {
        self.element_sink().element(signal);
        self.pump();
    }

    /// Metadata arrives with `duration_secs`
    pub fn element_ready(&mut self, duration_secs: f64) {
        self.element.borrow_mut().duration = duration_secs;
        self.element_event(ElementSignal::MetadataLoaded);
        if self.element.borrow().playing {
            self.element_event(ElementSignal::Playing);
        }
    }

    /// Element reports `seconds` of progress
    pub fn element_time(&mut self, seconds: f64) {
        self.element.borrow_mut().time = seconds;
        self.element_event(ElementSignal::TimeUpdate);
    }

    // ----- embedded player -----

    pub fn player(&self, index: usize) -> Rc<RefCell<PlayerProbe>> {
        Rc::clone(&self.host.borrow().players[index])
    }

    pub fn last_player(&self) -> Rc<RefCell<PlayerProbe>> {
        Rc::clone(self.host.borrow().players.last().expect("no player built"))
    }

    /// Deliver a notification from the newest player and pump
    pub fn player_event(&mut self, signal: EmbedSignal) {
        let sink = self.last_player().borrow().sink.clone();
        sink.embed(signal);
        self.pump();
    }

    pub fn player_ready(&mut self, duration_secs: f64) {
        self.last_player().borrow_mut().duration = duration_secs;
        self.player_event(EmbedSignal::PlayerReady);
    }

    pub fn player_state(&mut self, state: EmbedPlayerState) {
        self.player_event(EmbedSignal::StateChanged(state));
    }
}

// ===== Tracks =====

pub fn direct_track(id: &str, duration_secs: u64) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        "Test Artist",
        Duration::from_secs(duration_secs),
        AudioSource::Direct(format!("https://cdn.example.com/audio/{id}.mp3")),
    )
}

pub fn embedded_track(id: &str, duration_secs: u64) -> Track {
    Track::new(
        id,
        format!("Video {id}"),
        "Test Artist",
        Duration::from_secs(duration_secs),
        AudioSource::Embedded(format!("vid-{id}")),
    )
}

/// Let spawned analytics calls run
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
