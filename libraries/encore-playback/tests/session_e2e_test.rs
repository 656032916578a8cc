//! End-to-end tests for PlaybackSession
//!
//! Drives a session against a recording mock backend:
//! - Queue positioning and skip boundaries
//! - End-of-track policy per repeat mode
//! - Load generations and stale callbacks
//! - Buffered controls before ready
//! - Volume and mute
//! - Load failures

use encore_core::{Track, TrackId};
use encore_playback::{
    BackendNotification, LoadGeneration, MediaBackend, PlaybackConfig, PlaybackError,
    PlaybackEvent, PlaybackSession, PlaybackStatus, QueueManager, RepeatMode, Result, SeekTarget,
};
use std::collections::HashSet;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load {
        id: String,
        autoplay: bool,
        generation: u64,
    },
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(u8),
    Teardown,
}

/// Mock backend that records every call
#[derive(Debug, Default)]
struct MockBackend {
    calls: Vec<Call>,
    position: f64,
    /// Track ids the backend refuses synchronously
    broken_ids: HashSet<String>,
}

impl MockBackend {
    fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl MediaBackend for MockBackend {
    fn load(&mut self, track_id: &TrackId, autoplay: bool, generation: LoadGeneration) -> Result<()> {
        if self.broken_ids.contains(track_id.as_str()) {
            return Err(PlaybackError::load_failure(track_id, "embedding disabled"));
        }
        self.position = 0.0;
        self.calls.push(Call::Load {
            id: track_id.to_string(),
            autoplay,
            generation: generation.value(),
        });
        Ok(())
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn seek_to(&mut self, secs: f64) {
        self.position = secs;
        self.calls.push(Call::SeekTo(secs));
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn set_volume(&mut self, level: u8) {
        self.calls.push(Call::SetVolume(level));
    }

    fn teardown(&mut self) {
        self.calls.push(Call::Teardown);
    }
}

type Session = PlaybackSession<MockBackend>;

fn create_test_tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter()
        .map(|id| Track::new(*id, format!("Song {id}"), "Channel"))
        .collect()
}

fn new_session() -> Session {
    PlaybackSession::new(MockBackend::default(), &PlaybackConfig::default())
}

/// Session playing `start` within `ids`, backend ready
fn playing_session(ids: &[&str], start: &str, repeat: RepeatMode) -> Session {
    let mut session = new_session();
    session.set_repeat_mode(repeat);
    start_in_context(&mut session, ids, start);
    ready(&mut session, 200.0);
    session.backend_mut().take_calls();
    session.drain_events();
    session
}

fn start_in_context(session: &mut Session, ids: &[&str], start: &str) {
    let tracks = create_test_tracks(ids);
    let track = tracks
        .iter()
        .find(|track| track.id.as_str() == start)
        .cloned()
        .unwrap();
    session.play_track(track, Some(tracks)).unwrap();
}

fn ready(session: &mut Session, duration: f64) {
    let generation = session.generation();
    session
        .handle_notification(BackendNotification::ready(generation, duration))
        .unwrap();
}

fn end_track(session: &mut Session) {
    let generation = session.generation();
    session
        .handle_notification(BackendNotification::ended(generation))
        .unwrap();
}

fn current_id(session: &Session) -> String {
    session.current_track().unwrap().id.to_string()
}

// ============================================================================
// Queue positioning
// ============================================================================

#[test]
fn play_in_context_positions_on_chosen_track() {
    let mut session = new_session();
    start_in_context(&mut session, &["t1", "t2", "t3"], "t3");

    assert_eq!(session.current_index(), Some(2));
    assert_eq!(session.queue().len(), 3);
    assert_eq!(session.status(), PlaybackStatus::Loading);
}

#[test]
fn empty_context_is_rejected() {
    let mut session = new_session();
    let err = session
        .play_track(create_test_tracks(&["t1"]).remove(0), Some(Vec::new()))
        .unwrap_err();

    assert_eq!(err, PlaybackError::EmptyQueue);
    assert_eq!(session.status(), PlaybackStatus::Idle);
    assert!(session.backend().calls.is_empty());
}

#[test]
fn previous_at_first_track_is_noop_in_every_mode() {
    for mode in [RepeatMode::Off, RepeatMode::All, RepeatMode::One] {
        let mut session = playing_session(&["t1", "t2", "t3"], "t1", mode);

        session.skip_previous().unwrap();

        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.status(), PlaybackStatus::Playing);
        assert!(session.backend().calls.is_empty(), "mode {mode}");
    }
}

#[test]
fn skip_next_at_end_is_noop() {
    let mut session = playing_session(&["t1", "t2"], "t2", RepeatMode::Off);
    assert!(!session.can_skip_next());

    session.skip_next().unwrap();

    assert_eq!(session.current_index(), Some(1));
    assert!(session.backend().calls.is_empty());
}

#[test]
fn sequential_walk_then_end() {
    let mut session = playing_session(&["t1", "t2", "t3"], "t1", RepeatMode::Off);

    session.skip_next().unwrap();
    assert_eq!(current_id(&session), "t2");
    ready(&mut session, 180.0);

    session.skip_next().unwrap();
    assert_eq!(current_id(&session), "t3");
    ready(&mut session, 180.0);

    end_track(&mut session);

    assert_eq!(session.status(), PlaybackStatus::Ended);
    assert_eq!(session.current_index(), Some(2));
}

#[test]
fn jump_to_plays_slot() {
    let mut session = playing_session(&["t1", "t2", "t3"], "t1", RepeatMode::Off);

    session.jump_to(2).unwrap();
    assert_eq!(current_id(&session), "t3");

    assert_eq!(session.jump_to(7), Err(PlaybackError::IndexOutOfBounds(7)));
    assert_eq!(session.current_index(), Some(2));
}

// ============================================================================
// End-of-track policy
// ============================================================================

#[test]
fn repeat_off_last_track_ends() {
    let mut session = playing_session(&["t1", "t2"], "t2", RepeatMode::Off);

    end_track(&mut session);

    assert_eq!(session.status(), PlaybackStatus::Ended);
    assert_eq!(session.current_index(), Some(1));
    assert!(session.backend().calls.is_empty());
}

#[test]
fn repeat_all_last_track_wraps_and_loads_first() {
    let mut session = playing_session(&["t1", "t2"], "t2", RepeatMode::All);
    let before = session.generation();

    end_track(&mut session);

    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.status(), PlaybackStatus::Loading);
    assert_eq!(
        session.backend_mut().take_calls(),
        vec![
            Call::Teardown,
            Call::Load {
                id: "t1".to_string(),
                autoplay: true,
                generation: before.next().value(),
            },
        ]
    );
}

#[test]
fn repeat_one_restarts_same_track() {
    let mut session = playing_session(&["t1", "t2"], "t1", RepeatMode::One);

    end_track(&mut session);

    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.status(), PlaybackStatus::Playing);
    assert_eq!(session.current_time(), 0.0);
    assert_eq!(
        session.backend_mut().take_calls(),
        vec![Call::SeekTo(0.0), Call::Play]
    );

    // The restarted track can end again on the same generation
    end_track(&mut session);
    assert_eq!(session.backend().calls, vec![Call::SeekTo(0.0), Call::Play]);
}

#[test]
fn end_of_track_events() {
    let mut session = playing_session(&["t1", "t2"], "t1", RepeatMode::Off);

    end_track(&mut session);
    let events = session.drain_events();

    assert_eq!(
        events[0],
        PlaybackEvent::StateChanged {
            status: PlaybackStatus::Ended
        }
    );
    assert_eq!(
        events[1],
        PlaybackEvent::TrackFinished {
            track_id: TrackId::new("t1")
        }
    );
    assert!(events.iter().any(|event| matches!(
        event,
        PlaybackEvent::TrackChanged { track_id, previous_track_id: Some(previous), .. }
            if track_id.as_str() == "t2" && previous.as_str() == "t1"
    )));
}

// ============================================================================
// Load generations
// ============================================================================

#[test]
fn stale_callbacks_after_newer_load_are_ignored() {
    let mut session = playing_session(&["t1", "t2", "t3"], "t1", RepeatMode::Off);
    let old = session.generation();

    session.skip_next().unwrap();
    assert_eq!(session.status(), PlaybackStatus::Loading);

    // Late callbacks from t1's load
    session
        .handle_notification(BackendNotification::ready(old, 100.0))
        .unwrap();
    session
        .handle_notification(BackendNotification::ended(old))
        .unwrap();

    assert_eq!(session.status(), PlaybackStatus::Loading);
    assert_eq!(session.current_index(), Some(1));
    assert!(!session.poll_progress(old));
}

#[test]
fn rapid_skips_only_honor_latest_load() {
    let mut session = playing_session(&["t1", "t2", "t3", "t4"], "t1", RepeatMode::Off);

    session.skip_next().unwrap();
    let second = session.generation();
    session.skip_next().unwrap();
    session.skip_next().unwrap();
    let latest = session.generation();

    session
        .handle_notification(BackendNotification::ready(second, 100.0))
        .unwrap();
    assert_eq!(session.status(), PlaybackStatus::Loading);

    session
        .handle_notification(BackendNotification::ready(latest, 100.0))
        .unwrap();
    assert_eq!(session.status(), PlaybackStatus::Playing);
    assert_eq!(current_id(&session), "t4");
}

#[test]
fn poll_writes_position_only_while_playing() {
    let mut session = playing_session(&["t1"], "t1", RepeatMode::Off);
    let generation = session.generation();

    session.backend_mut().position = 42.5;
    assert!(session.poll_progress(generation));
    assert_eq!(session.snapshot().current_time_secs, 42.5);

    session.pause().unwrap();
    session.backend_mut().position = 50.0;
    assert!(!session.poll_progress(generation));
    assert_eq!(session.current_time(), 42.5);
}

// ============================================================================
// Controls before ready
// ============================================================================

#[test]
fn toggle_while_loading_lands_paused() {
    let mut session = new_session();
    start_in_context(&mut session, &["t1"], "t1");
    session.backend_mut().take_calls();

    session.toggle_play_pause().unwrap();
    assert_eq!(session.status(), PlaybackStatus::Loading);
    assert!(session.backend().calls.is_empty());

    ready(&mut session, 120.0);

    assert_eq!(session.status(), PlaybackStatus::Paused);
    assert_eq!(
        session.backend_mut().take_calls(),
        vec![Call::SetVolume(50), Call::Pause]
    );
}

#[test]
fn seek_before_ready_is_applied_on_ready() {
    let mut session = new_session();
    start_in_context(&mut session, &["t1"], "t1");
    session.backend_mut().take_calls();

    session.seek(SeekTarget::from_percent(25.0)).unwrap();
    assert!(session.backend().calls.is_empty());

    ready(&mut session, 200.0);

    assert_eq!(
        session.backend_mut().take_calls(),
        vec![Call::SetVolume(50), Call::SeekTo(50.0)]
    );
    assert_eq!(session.snapshot().current_time_secs, 50.0);
}

#[test]
fn buffered_seek_is_dropped_when_a_newer_load_supersedes_it() {
    let mut session = new_session();
    start_in_context(&mut session, &["t1", "t2"], "t1");
    let first = session.generation();

    session.seek(SeekTarget::Seconds(90.0)).unwrap();
    session.skip_next().unwrap();
    assert_eq!(current_id(&session), "t2");
    session.backend_mut().take_calls();

    // The superseded load reporting ready must not flush anything either
    session
        .handle_notification(BackendNotification::ready(first, 200.0))
        .unwrap();
    assert!(session.backend().calls.is_empty());

    ready(&mut session, 200.0);

    assert_eq!(session.backend_mut().take_calls(), vec![Call::SetVolume(50)]);
    assert_eq!(session.status(), PlaybackStatus::Playing);
    assert_eq!(session.current_time(), 0.0);
}

#[test]
fn buffered_pause_is_dropped_when_a_newer_load_supersedes_it() {
    let mut session = new_session();
    start_in_context(&mut session, &["t1", "t2"], "t1");

    session.toggle_play_pause().unwrap();
    session.skip_next().unwrap();

    let calls = session.backend_mut().take_calls();
    assert!(calls.contains(&Call::Load {
        id: "t2".to_string(),
        autoplay: true,
        generation: session.generation().value(),
    }));
    assert!(!calls.contains(&Call::Pause));

    ready(&mut session, 200.0);

    assert_eq!(session.backend_mut().take_calls(), vec![Call::SetVolume(50)]);
    assert_eq!(session.status(), PlaybackStatus::Playing);
}

#[test]
fn seek_clamps_and_moves_ended_to_paused() {
    let mut session = playing_session(&["t1"], "t1", RepeatMode::Off);

    session.seek(SeekTarget::Seconds(999.0)).unwrap();
    assert_eq!(session.current_time(), 200.0);

    end_track(&mut session);
    assert_eq!(session.status(), PlaybackStatus::Ended);

    session.seek(SeekTarget::Seconds(30.0)).unwrap();
    assert_eq!(session.status(), PlaybackStatus::Paused);
    assert_eq!(session.current_time(), 30.0);
}

#[test]
fn seek_when_idle_fails() {
    let mut session = new_session();
    assert_eq!(
        session.seek(SeekTarget::Fraction(0.5)),
        Err(PlaybackError::SeekOutOfLoadedTrack)
    );
}

// ============================================================================
// Volume
// ============================================================================

#[test]
fn zero_volume_mutes_and_audible_volume_unmutes() {
    let mut session = playing_session(&["t1"], "t1", RepeatMode::Off);

    session.set_volume(0);
    assert!(session.is_muted());

    session.set_volume(40);
    assert!(!session.is_muted());
    assert_eq!(session.volume(), 40);

    assert_eq!(
        session.backend().calls,
        vec![Call::SetVolume(0), Call::SetVolume(40)]
    );
}

#[test]
fn toggle_mute_twice_restores_volume() {
    let mut session = playing_session(&["t1"], "t1", RepeatMode::Off);
    session.set_volume(73);

    session.toggle_mute();
    assert!(session.is_muted());
    assert_eq!(session.volume(), 73);

    session.toggle_mute();
    assert!(!session.is_muted());
    assert_eq!(session.volume(), 73);
    assert_eq!(session.backend().calls.last(), Some(&Call::SetVolume(73)));
}

#[test]
fn volume_above_range_is_clamped() {
    let mut session = new_session();
    session.set_volume(250);
    assert_eq!(session.volume(), 100);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn load_failure_keeps_queue_slot() {
    let mut session = playing_session(&["t1", "t2", "t3"], "t1", RepeatMode::Off);
    session.skip_next().unwrap();
    let generation = session.generation();

    let err = session
        .handle_notification(BackendNotification::load_failed(generation, "video unavailable"))
        .unwrap_err();

    assert!(matches!(err, PlaybackError::BackendLoadFailure { .. }));
    assert_eq!(session.status(), PlaybackStatus::Idle);
    assert_eq!(session.current_index(), Some(1));
    assert!(session
        .drain_events()
        .iter()
        .any(|event| matches!(event, PlaybackEvent::Error { message } if message.contains("video unavailable"))));

    // No automatic retry; the user can move on
    session.skip_next().unwrap();
    assert_eq!(current_id(&session), "t3");
    assert_eq!(session.status(), PlaybackStatus::Loading);
}

#[test]
fn synchronous_load_rejection_goes_idle() {
    let mut backend = MockBackend::default();
    backend.broken_ids.insert("t2".to_string());
    let mut session = PlaybackSession::new(backend, &PlaybackConfig::default());

    let tracks = create_test_tracks(&["t1", "t2"]);
    let err = session
        .play_track(tracks[1].clone(), Some(tracks))
        .unwrap_err();

    assert!(matches!(err, PlaybackError::BackendLoadFailure { .. }));
    assert_eq!(session.status(), PlaybackStatus::Idle);
    assert_eq!(session.current_index(), Some(1));
}

// ============================================================================
// Configuration, shuffle, lifecycle
// ============================================================================

#[test]
fn config_sets_initial_modes() {
    let config = PlaybackConfig {
        initial_volume: 80,
        shuffle: true,
        repeat: RepeatMode::All,
        ..Default::default()
    };
    let session = PlaybackSession::new(MockBackend::default(), &config);
    let state = session.snapshot();

    assert_eq!(state.volume, 80);
    assert!(state.shuffle_enabled);
    assert_eq!(state.repeat_mode, RepeatMode::All);
}

#[test]
fn shuffle_plays_every_track_once_then_ends() {
    let mut session = PlaybackSession::with_queue_manager(
        MockBackend::default(),
        &PlaybackConfig::default(),
        QueueManager::with_seed(9),
    );
    assert!(session.toggle_shuffle());
    start_in_context(&mut session, &["t1", "t2", "t3", "t4", "t5"], "t3");

    let mut played = vec![current_id(&session)];
    loop {
        ready(&mut session, 60.0);
        end_track(&mut session);
        if session.status() == PlaybackStatus::Ended {
            break;
        }
        played.push(current_id(&session));
    }

    let unique: HashSet<&String> = played.iter().collect();
    assert_eq!(played.len(), 5);
    assert_eq!(unique.len(), 5);
    // Stored order is untouched
    let order: Vec<&str> = session
        .queue()
        .tracks()
        .iter()
        .map(|track| track.id.as_str())
        .collect();
    assert_eq!(order, vec!["t1", "t2", "t3", "t4", "t5"]);
}

#[test]
fn cycle_repeat_mode_order() {
    let mut session = new_session();
    assert_eq!(session.cycle_repeat_mode(), RepeatMode::All);
    assert_eq!(session.cycle_repeat_mode(), RepeatMode::One);
    assert_eq!(session.cycle_repeat_mode(), RepeatMode::Off);
}

#[test]
fn dismiss_tears_down_and_ignores_late_callbacks() {
    let mut session = playing_session(&["t1", "t2"], "t1", RepeatMode::Off);
    let generation = session.generation();

    session.dismiss();

    assert_eq!(session.status(), PlaybackStatus::Idle);
    assert!(session.queue().is_empty());
    assert_eq!(session.backend().calls, vec![Call::Teardown]);

    session
        .handle_notification(BackendNotification::ended(generation))
        .unwrap();
    assert_eq!(session.status(), PlaybackStatus::Idle);

    // The surface can be reopened
    start_in_context(&mut session, &["t2"], "t2");
    assert_eq!(session.status(), PlaybackStatus::Loading);
}

#[test]
fn snapshot_reflects_session() {
    let mut session = playing_session(&["t1", "t2", "t3"], "t2", RepeatMode::Off);
    session.toggle_liked(TrackId::new("t2"));
    session.backend_mut().position = 90.0;
    let generation = session.generation();
    session.poll_progress(generation);

    let state = session.snapshot();
    assert_eq!(state.status, PlaybackStatus::Playing);
    assert_eq!(state.current_index, Some(1));
    assert_eq!(state.queue_length, 3);
    assert!(state.can_skip_next);
    assert!(state.can_skip_previous);
    assert!(state.current_track_liked());
    assert_eq!(state.progress_percent(), 45.0);
    assert_eq!(state.elapsed_label(), "1:30");
    assert_eq!(state.duration_label(), "3:20");
}
