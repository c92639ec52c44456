use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use crate::config::EngineSettings;

use super::*;

struct Running {
    player: Player,
    backend: Shared<BackendLog>,
    states: Receiver<PlaybackState>,
}

fn spawn_player() -> Running {
    spawn_player_with_tick(10)
}

fn spawn_player_with_tick(tick_ms: u64) -> Running {
    let backend = Shared::<BackendLog>::default();
    let log = backend.clone();
    let settings = EngineSettings {
        tick_ms,
        ..EngineSettings::default()
    };

    let player = Player::spawn(
        move |_events| Ok(FakeBackend { log }),
        Arc::new(catalog()),
        settings,
        |_events| Wiring {
            focus: Box::new(FakeFocus(Shared::default())),
            route: Box::new(NullRoute),
            observers: Vec::new(),
        },
    );
    let (tx, states) = mpsc::channel();
    player.subscribe(channel_observer(tx));

    Running {
        player,
        backend,
        states,
    }
}

fn wait_for(rx: &Receiver<PlaybackState>, want: Status) -> PlaybackState {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let state = rx
            .recv_timeout(left)
            .unwrap_or_else(|_| panic!("no {want:?} state published"));
        if state.status == want {
            return state;
        }
    }
}

#[test]
fn commands_and_signals_are_serialized_through_the_engine() {
    let r = spawn_player();
    r.player.send(EngineCmd::Append("a".into())).unwrap();
    r.player.send(EngineCmd::Append("b".into())).unwrap();
    r.player.send(EngineCmd::Play).unwrap();
    let playing = wait_for(&r.states, Status::Playing);
    assert_eq!(playing.track.as_ref().map(|t| t.id.as_str()), Some("a"));

    let events = r.player.events();
    events.focus_changed(FocusChange::LossTransient);
    wait_for(&r.states, Status::Paused);
    events.focus_changed(FocusChange::Gain);
    wait_for(&r.states, Status::Playing);

    r.player.send(EngineCmd::SkipNext).unwrap();
    let next = wait_for(&r.states, Status::Playing);
    assert_eq!(next.track.as_ref().map(|t| t.id.as_str()), Some("b"));

    r.player.quit();
    wait_for(&r.states, Status::Stopped);
    assert!(matches!(
        r.player.send(EngineCmd::Play),
        Err(PlaybackError::Disconnected)
    ));
    assert_eq!(r.player.latest().map(|s| s.status), Some(Status::Stopped));
}

#[test]
fn finished_decoder_is_noticed_by_polling() {
    let r = spawn_player();
    r.player.send(EngineCmd::PlayFromId("c".into())).unwrap();
    wait_for(&r.states, Status::Playing);

    r.backend.lock().unwrap().finished = true;
    wait_for(&r.states, Status::Paused);

    r.player.send(EngineCmd::Play).unwrap();
    wait_for(&r.states, Status::Playing);
    assert_eq!(r.backend.lock().unwrap().opened.len(), 2);
    r.player.quit();
}

#[test]
fn noisy_signal_pauses_playback() {
    let r = spawn_player();
    r.player.send(EngineCmd::PlayFromSearch("shoulder".into())).unwrap();
    wait_for(&r.states, Status::Playing);

    r.player.events().output_noisy();
    let paused = wait_for(&r.states, Status::Paused);
    assert_eq!(paused.track.as_ref().map(|t| t.id.as_str()), Some("b"));
    r.player.quit();
}

#[test]
fn pushed_completion_reloads_on_next_play() {
    // Polling alone would not notice within the test.
    let r = spawn_player_with_tick(60_000);
    r.player.send(EngineCmd::PlayFromId("a".into())).unwrap();
    wait_for(&r.states, Status::Playing);

    r.backend.lock().unwrap().finished = true;
    r.player.events().decoder_completed();
    wait_for(&r.states, Status::Paused);

    r.player.send(EngineCmd::Play).unwrap();
    wait_for(&r.states, Status::Playing);
    let backend = r.backend.lock().unwrap();
    assert_eq!(backend.opened.len(), 2);
    assert_eq!(backend.released, vec![0]);
    drop(backend);
    r.player.quit();
}

#[test]
fn completion_is_noticed_between_back_to_back_commands() {
    let r = spawn_player_with_tick(60_000);
    r.player.send(EngineCmd::PlayFromId("b".into())).unwrap();
    wait_for(&r.states, Status::Playing);

    r.backend.lock().unwrap().finished = true;
    r.player.send(EngineCmd::SetVolume(0.5)).unwrap();
    let paused = wait_for(&r.states, Status::Paused);
    assert_eq!(paused.track.as_ref().map(|t| t.id.as_str()), Some("b"));
    r.player.quit();
}

#[test]
fn backend_failure_is_published_as_stopped_with_error() {
    let (tx, states) = mpsc::channel();
    let player = Player::spawn(
        |_events| -> Result<FakeBackend, PlaybackError> {
            Err(PlaybackError::OutputUnavailable("no device".into()))
        },
        Arc::new(catalog()),
        EngineSettings::default(),
        |_events| Wiring {
            focus: Box::new(FakeFocus(Shared::default())),
            route: Box::new(NullRoute),
            observers: vec![channel_observer(tx)],
        },
    );
    player.quit();

    // Observers handed over at spawn see the failure even though it is
    // published before `spawn` returns.
    let stopped = wait_for(&states, Status::Stopped);
    assert!(stopped.error.as_deref().is_some_and(|e| e.contains("no device")));

    let latest = player.latest().unwrap();
    assert_eq!(latest.status, Status::Stopped);
    assert!(latest.error.unwrap().contains("no device"));
}
