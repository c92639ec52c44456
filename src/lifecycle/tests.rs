use std::sync::Arc;

use super::*;

fn recording() -> (ServiceLifecycle, Arc<Mutex<Vec<LifecycleTransition>>>) {
    let seen: Arc<Mutex<Vec<LifecycleTransition>>> = Arc::default();
    let sink = seen.clone();
    let lifecycle = ServiceLifecycle::new(move |t, _| sink.lock().unwrap().push(t));
    (lifecycle, seen)
}

fn feed(lifecycle: &ServiceLifecycle, statuses: &[Status]) {
    for status in statuses {
        lifecycle
            .on_state(&PlaybackState::new(*status, 0))
            .unwrap();
    }
}

#[test]
fn play_pause_stop_cycle() {
    let (lifecycle, seen) = recording();
    feed(
        &lifecycle,
        &[Status::Preparing, Status::Playing, Status::Paused, Status::Stopped],
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            LifecycleTransition::StartForeground,
            LifecycleTransition::RefreshNotification,
            LifecycleTransition::LeaveForeground,
        ]
    );
    assert!(!lifecycle.is_started());
}

#[test]
fn playing_again_only_refreshes() {
    let (lifecycle, seen) = recording();
    feed(&lifecycle, &[Status::Playing, Status::Paused, Status::Playing]);
    assert!(lifecycle.is_started());
    assert_eq!(
        seen.lock().unwrap().last(),
        Some(&LifecycleTransition::RefreshNotification)
    );
}

#[test]
fn stop_without_start_still_leaves_foreground() {
    let (lifecycle, seen) = recording();
    feed(&lifecycle, &[Status::Stopped]);
    assert_eq!(*seen.lock().unwrap(), vec![LifecycleTransition::LeaveForeground]);
}

#[test]
fn pause_before_start_is_ignored() {
    let (lifecycle, seen) = recording();
    feed(&lifecycle, &[Status::Idle, Status::Paused]);
    assert!(seen.lock().unwrap().is_empty());
}
