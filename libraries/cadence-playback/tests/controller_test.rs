//! Controller integration tests
//!
//! Drive the controller with real backends over fake host elements and
//! verify transport, queue and failure behavior end to end.

mod common;

use cadence_playback::{ElementSignal, PlaybackConfig, PlaybackEvent, PlaybackState};
use common::{direct_track, embedded_track, Harness};
use std::time::Duration;

fn current_id(h: &Harness) -> Option<String> {
    h.controller.current_track().map(|t| t.id.clone())
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

// ===== Basic Playback =====

#[test]
fn play_track_then_ready_is_playing_from_zero() {
    let mut h = Harness::new();
    let track = direct_track("a", 180);

    h.controller.play_track(track.clone());
    assert_eq!(h.controller.state(), PlaybackState::Loading);
    assert!(h.controller.is_playing());

    h.element_ready(180.0);

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.current_track, Some(track));
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.position, Duration::ZERO);
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert!(h.element.borrow().playing);
}

#[test]
fn play_track_enqueues_once() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    h.controller.play_track(direct_track("b", 100));
    h.controller.play_track(direct_track("a", 100));

    assert_eq!(h.controller.queue().len(), 2);
    assert_eq!(current_id(&h).as_deref(), Some("a"));
    assert_eq!(h.controller.queue().current_index(), Some(0));
}

#[test]
fn play_queue_with_no_tracks_changes_nothing() {
    let mut h = Harness::new();
    let before = h.controller.snapshot();
    h.controller.play_queue(Vec::new(), 3);
    assert_eq!(h.controller.snapshot(), before);
    assert!(h.controller.drain_events().is_empty());

    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 1);
    h.element_ready(100.0);
    h.controller.drain_events();

    let before = h.controller.snapshot();
    h.controller.play_queue(Vec::new(), 0);
    assert_eq!(h.controller.snapshot(), before);
    assert_eq!(h.controller.queue().len(), 2);
    assert!(h.controller.drain_events().is_empty());
}

#[test]
fn play_queue_starts_at_index() {
    let mut h = Harness::new();
    h.controller.play_queue(
        vec![
            direct_track("a", 100),
            direct_track("b", 100),
            direct_track("c", 100),
        ],
        1,
    );

    assert_eq!(current_id(&h).as_deref(), Some("b"));
    assert_eq!(
        h.element.borrow().source.as_deref(),
        Some("https://cdn.example.com/audio/b.mp3")
    );
}

// ===== Intent Before Ready =====

#[test]
fn last_intent_before_ready_wins() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 120));
    h.controller.toggle_play_pause();

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.state(), PlaybackState::Loading);

    h.element_ready(120.0);
    assert!(!h.element.borrow().playing);
    assert_eq!(h.controller.state(), PlaybackState::Paused);

    h.controller.toggle_play_pause();
    assert!(h.element.borrow().playing);
    assert_eq!(h.controller.state(), PlaybackState::Playing);
}

#[test]
fn pause_and_resume_same_track() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 120));
    h.element_ready(120.0);
    h.element_time(30.0);

    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlaybackState::Paused);
    assert!(!h.element.borrow().playing);

    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlaybackState::Playing);
    assert_eq!(h.controller.position(), secs(30));
    // Resuming does not reload the source
    assert_eq!(h.element.borrow().sources_loaded, 1);
}

#[test]
fn play_with_nothing_loaded_starts_queue() {
    let mut h = Harness::new();
    assert!(h.controller.add_to_queue(direct_track("a", 100)));
    assert!(h.controller.add_to_queue(direct_track("b", 100)));
    assert!(!h.controller.add_to_queue(direct_track("a", 100)));

    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(h.controller.current_track().is_none());

    h.controller.toggle_play_pause();
    assert_eq!(current_id(&h).as_deref(), Some("a"));
    assert_eq!(h.controller.state(), PlaybackState::Loading);
}

#[test]
fn play_on_empty_controller_is_noop() {
    let mut h = Harness::new();
    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(!h.controller.is_playing());
}

// ===== Next / Previous =====

#[test]
fn three_track_walk_with_repeat() {
    let mut h = Harness::new();
    h.controller.play_queue(
        vec![
            direct_track("A", 180),
            direct_track("B", 200),
            direct_track("C", 150),
        ],
        0,
    );
    h.element_ready(180.0);

    h.controller.next();
    h.element_ready(200.0);
    h.controller.next();
    h.element_ready(150.0);
    assert_eq!(current_id(&h).as_deref(), Some("C"));

    h.element_time(40.0);
    h.controller.next();
    assert_eq!(current_id(&h).as_deref(), Some("C"));
    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(!h.element.borrow().playing);

    h.controller.toggle_repeat();
    h.controller.next();
    assert_eq!(current_id(&h).as_deref(), Some("A"));
    assert_eq!(h.controller.position(), Duration::ZERO);
    assert!(h.controller.is_playing());
}

#[test]
fn previous_clamps_at_first_entry() {
    let mut h = Harness::new();
    h.controller.play_queue(
        vec![
            direct_track("a", 100),
            direct_track("b", 100),
            direct_track("c", 100),
        ],
        0,
    );
    h.element_ready(100.0);

    for _ in 0..3 {
        h.controller.previous();
        assert_eq!(current_id(&h).as_deref(), Some("a"));
        assert!(h.controller.is_playing());
        assert_eq!(h.controller.position(), Duration::ZERO);
    }
}

#[test]
fn previous_goes_back_even_mid_track_by_default() {
    let mut h = Harness::new();
    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 1);
    h.element_ready(100.0);
    h.element_time(50.0);

    h.controller.previous();
    assert_eq!(current_id(&h).as_deref(), Some("a"));
}

#[test]
fn previous_restarts_past_threshold() {
    let mut h = Harness::with_config(PlaybackConfig {
        previous_restart_threshold_secs: Some(3),
        ..PlaybackConfig::default()
    });
    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 1);
    h.element_ready(100.0);
    h.element_time(10.0);

    h.controller.previous();
    assert_eq!(current_id(&h).as_deref(), Some("b"));
    assert_eq!(h.controller.position(), Duration::ZERO);
    assert_eq!(h.element.borrow().seeks.last(), Some(&0.0));

    h.controller.previous();
    assert_eq!(current_id(&h).as_deref(), Some("a"));
}

#[test]
fn next_and_previous_on_empty_queue_are_noops() {
    let mut h = Harness::new();
    h.controller.next();
    h.controller.previous();

    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(h.controller.drain_events().is_empty());
}

#[test]
fn ended_advances_to_next_entry() {
    let mut h = Harness::new();
    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 0);
    h.element_ready(100.0);
    h.controller.drain_events();

    h.element_event(ElementSignal::Ended);

    assert_eq!(current_id(&h).as_deref(), Some("b"));
    assert_eq!(h.controller.state(), PlaybackState::Loading);
    assert!(h.controller.is_playing());

    let events = h.controller.drain_events();
    assert!(events.contains(&PlaybackEvent::TrackFinished {
        track_id: "a".to_string()
    }));
    assert!(events.contains(&PlaybackEvent::TrackChanged {
        track_id: Some("b".to_string()),
        previous_track_id: Some("a".to_string()),
    }));
}

#[test]
fn ended_on_last_entry_stops_and_play_restarts() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    h.element_ready(100.0);

    h.element_event(ElementSignal::Ended);
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(!h.controller.is_playing());
    assert_eq!(current_id(&h).as_deref(), Some("a"));

    // A late pause echo does not leave Idle
    h.element_event(ElementSignal::Paused);
    assert_eq!(h.controller.state(), PlaybackState::Idle);

    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlaybackState::Loading);
    assert_eq!(h.element.borrow().sources_loaded, 2);
}

#[test]
fn shuffled_walk_visits_every_track_once() {
    let mut h = Harness::new();
    let tracks: Vec<_> = (0..6).map(|i| direct_track(&i.to_string(), 100)).collect();
    h.controller.play_queue(tracks, 0);
    h.element_ready(100.0);

    h.controller.toggle_shuffle();
    assert!(h.controller.snapshot().shuffle);
    assert_eq!(current_id(&h).as_deref(), Some("0"));

    let mut seen = vec![current_id(&h).unwrap()];
    for _ in 0..10 {
        h.controller.next();
        if h.controller.state() == PlaybackState::Idle {
            break;
        }
        seen.push(current_id(&h).unwrap());
        h.element_ready(100.0);
    }

    seen.sort();
    assert_eq!(seen, vec!["0", "1", "2", "3", "4", "5"]);
}

// ===== Seek & Volume =====

#[test]
fn seek_updates_position_immediately() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 180));
    h.element_ready(180.0);

    h.controller.seek_to(secs(42));
    assert_eq!(h.controller.position(), secs(42));
    assert_eq!(h.element.borrow().seeks, vec![42.0]);

    h.controller.seek_to(secs(500));
    assert_eq!(h.controller.position(), secs(180));
}

#[test]
fn seek_without_track_is_ignored() {
    let mut h = Harness::new();
    h.controller.seek_to(secs(10));
    assert_eq!(h.controller.position(), Duration::ZERO);
}

#[test]
fn volume_without_track_applies_at_next_ready() {
    let mut h = Harness::new();
    h.controller.set_volume(35);
    assert_eq!(h.controller.snapshot().volume, 35);

    h.controller.play_track(direct_track("a", 100));
    h.element_ready(100.0);
    assert!((h.element.borrow().volume - 0.35).abs() < 1e-9);

    h.controller.play_track(embedded_track("v", 100));
    h.player_ready(100.0);
    assert_eq!(h.last_player().borrow().volume, Some(35));
}

#[test]
fn volume_is_clamped() {
    let mut h = Harness::new();
    h.controller.set_volume(240);
    assert_eq!(h.controller.volume(), 100);
}

#[test]
fn mute_silences_without_losing_level() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    h.element_ready(100.0);
    h.controller.set_volume(60);

    h.controller.toggle_mute();
    assert_eq!(h.element.borrow().volume, 0.0);
    assert!(h.controller.snapshot().muted);
    assert_eq!(h.controller.snapshot().volume, 60);

    h.controller.toggle_mute();
    assert!((h.element.borrow().volume - 0.6).abs() < 1e-9);
}

#[test]
fn duration_is_recaptured() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 1));
    assert_eq!(h.controller.duration(), secs(1));

    h.element_ready(200.0);
    assert_eq!(h.controller.duration(), secs(200));

    h.element.borrow_mut().duration = 210.0;
    h.element_event(ElementSignal::DurationChanged);
    assert_eq!(h.controller.duration(), secs(210));
}

#[test]
fn lyrics_follow_position() {
    let mut h = Harness::new();
    let mut track = direct_track("a", 100);
    track.lyrics = vec![cadence_playback::LyricLine {
        start: secs(5),
        end: secs(10),
        text: "hello".to_string(),
    }];
    h.controller.play_track(track);
    h.element_ready(100.0);

    assert!(h.controller.current_lyric().is_none());
    h.element_time(6.0);
    assert_eq!(h.controller.current_lyric().unwrap().text, "hello");
}

// ===== Queue Hygiene =====

#[test]
fn removing_current_keeps_it_playing() {
    let mut h = Harness::new();
    h.controller.play_queue(
        vec![
            direct_track("a", 100),
            direct_track("b", 100),
            direct_track("c", 100),
        ],
        1,
    );
    h.element_ready(100.0);

    assert!(h.controller.remove_from_queue("b"));
    assert_eq!(h.controller.queue().len(), 2);
    assert_eq!(current_id(&h).as_deref(), Some("b"));
    assert!(h.controller.is_playing());
    assert!(h.element.borrow().playing);

    h.controller.next();
    assert_eq!(current_id(&h).as_deref(), Some("c"));
}

#[test]
fn removing_unknown_id_returns_false() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    assert!(!h.controller.remove_from_queue("zzz"));
    assert_eq!(h.controller.queue().len(), 1);
}

#[test]
fn removing_last_entry_stops_playback() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    h.element_ready(100.0);

    assert!(h.controller.remove_from_queue("a"));

    assert!(h.controller.queue().is_empty());
    assert!(h.controller.current_track().is_none());
    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert!(h.element.borrow().source.is_none());
}

#[test]
fn clear_queue_tears_everything_down() {
    let mut h = Harness::new();
    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 0);
    h.element_ready(100.0);
    let stale = h.element_sink();

    h.controller.clear_queue();

    let snapshot = h.controller.snapshot();
    assert!(snapshot.current_track.is_none());
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert!(h.controller.queue().is_empty());
    assert!(h.element.borrow().source.is_none());
    assert!(h.element.borrow().sink.is_none());

    h.element.borrow_mut().time = 77.0;
    stale.element(ElementSignal::TimeUpdate);
    h.pump();
    assert_eq!(h.controller.position(), Duration::ZERO);
}

// ===== Failures =====

#[test]
fn play_rejection_leaves_paused_on_same_track() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));
    h.element_ready(100.0);
    h.controller.drain_events();

    h.element_event(ElementSignal::PlayRejected("NotAllowedError".to_string()));

    let snapshot = h.controller.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.state, PlaybackState::Paused);
    assert_eq!(snapshot.current_track.unwrap().id, "a");

    let events = h.controller.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::Error { track_id: Some(id), message } if id == "a" && message.contains("NotAllowedError")
    )));

    // Retry is just pressing play
    h.controller.toggle_play_pause();
    assert!(h.controller.is_playing());
    assert_eq!(h.element.borrow().play_calls, 2);
}

#[test]
fn media_error_before_ready_reloads_on_retry() {
    let mut h = Harness::new();
    h.controller.play_track(direct_track("a", 100));

    h.element_event(ElementSignal::Error("network".to_string()));
    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.state(), PlaybackState::Paused);

    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlaybackState::Loading);
    assert_eq!(h.element.borrow().sources_loaded, 2);
}

#[test]
fn failures_are_not_retried_automatically() {
    let mut h = Harness::new();
    h.controller
        .play_queue(vec![direct_track("a", 100), direct_track("b", 100)], 0);
    h.element_ready(100.0);

    h.element_event(ElementSignal::Error("decode".to_string()));

    assert_eq!(current_id(&h).as_deref(), Some("a"));
    assert_eq!(h.element.borrow().sources_loaded, 1);
    assert_eq!(h.element.borrow().play_calls, 1);
}

// ===== Events & Shutdown =====

#[test]
fn toggles_emit_events() {
    let mut h = Harness::new();
    h.controller.toggle_shuffle();
    h.controller.toggle_repeat();
    h.controller.set_volume(20);

    let events = h.controller.drain_events();
    assert_eq!(
        events,
        vec![
            PlaybackEvent::ShuffleChanged { enabled: true },
            PlaybackEvent::RepeatChanged { enabled: true },
            PlaybackEvent::VolumeChanged {
                level: 20,
                is_muted: false
            },
        ]
    );
    assert!(!h.controller.has_pending_events());
}

#[test]
fn shutdown_disposes_active_backend() {
    let mut h = Harness::new();
    h.controller.play_track(embedded_track("v", 100));
    h.player_ready(100.0);

    h.controller.shutdown();

    assert!(h.last_player().borrow().destroyed);
    assert!(h.host.borrow().containers.is_empty());
    assert_eq!(h.controller.state(), PlaybackState::Idle);
    assert_eq!(current_id(&h).as_deref(), Some("v"));
}

#[test]
fn dropping_controller_disposes_active_backend() {
    let h = Harness::new();
    let Harness {
        mut controller,
        element,
        ..
    } = h;
    controller.play_track(direct_track("a", 100));
    assert!(element.borrow().source.is_some());

    drop(controller);
    assert!(element.borrow().source.is_none());
}
