use std::time::{Duration, Instant};

use super::*;

const ALWAYS: [Actions; 4] = [
    Actions::SKIP_TO_NEXT,
    Actions::SKIP_TO_PREVIOUS,
    Actions::PLAY_FROM_ID,
    Actions::PLAY_FROM_SEARCH,
];

#[test]
fn actions_table() {
    let stopped = Actions::for_status(Status::Stopped);
    assert!(stopped.contains(Actions::PLAY | Actions::PAUSE));
    assert!(!stopped.contains(Actions::STOP));
    assert!(!stopped.contains(Actions::SEEK_TO));

    let playing = Actions::for_status(Status::Playing);
    assert!(playing.contains(Actions::STOP | Actions::PAUSE | Actions::SEEK_TO));
    assert!(!playing.contains(Actions::PLAY));

    let paused = Actions::for_status(Status::Paused);
    assert!(paused.contains(Actions::PLAY | Actions::STOP));
    assert!(!paused.contains(Actions::PAUSE));

    for status in [Status::Idle, Status::Preparing] {
        let a = Actions::for_status(status);
        assert!(a.contains(Actions::PLAY | Actions::PAUSE | Actions::STOP | Actions::PLAY_PAUSE));
        assert!(!a.contains(Actions::SEEK_TO));
    }
}

#[test]
fn skip_and_lookup_actions_are_always_present() {
    for status in [
        Status::Idle,
        Status::Preparing,
        Status::Playing,
        Status::Paused,
        Status::Stopped,
    ] {
        let a = Actions::for_status(status);
        for flag in ALWAYS {
            assert!(a.contains(flag), "{status:?} lacks {flag:?}");
        }
    }
}

#[test]
fn actions_debug_lists_names() {
    let a = Actions::PLAY | Actions::STOP;
    assert_eq!(format!("{a:?}"), "Actions(play | stop)");
    assert_eq!(format!("{:?}", Actions::default()), "Actions()");
}

#[test]
fn position_extrapolates_only_while_playing() {
    let mut state = PlaybackState::new(Status::Playing, 1_000);
    let later = state.updated_at + Duration::from_millis(500);
    assert_eq!(state.position_at(later), 1_500);

    state.status = Status::Paused;
    assert_eq!(state.position_at(later), 1_000);
}

#[test]
fn position_is_capped_by_track_duration() {
    let mut track = crate::catalog::TrackMetadata::new("a", "A");
    track.duration_ms = 2_000;
    let mut state = PlaybackState::new(Status::Playing, 1_900);
    state.track = Some(std::sync::Arc::new(track));
    let later = Instant::now() + Duration::from_secs(10);
    assert_eq!(state.position_at(later), 2_000);
}

#[test]
fn default_snapshot_is_idle() {
    let state = PlaybackState::default();
    assert_eq!(state.status, Status::Idle);
    assert_eq!(state.position_ms, 0);
    assert!(state.error.is_none());
}
