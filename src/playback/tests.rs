//! Shared fakes for the playback tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::{LibraryCatalog, SourceLocator, TrackMetadata};
use crate::error::{ObserverError, PlaybackError};

use super::*;

mod player;
mod state;

#[derive(Debug, Default)]
pub(super) struct BackendLog {
    next_id: u32,
    pub opened: Vec<(u32, PathBuf)>,
    pub released: Vec<u32>,
    pub failing: HashSet<PathBuf>,
    pub playing: bool,
    pub finished: bool,
    pub position: Duration,
    pub volume: f32,
    pub seeks: Vec<Duration>,
}

impl BackendLog {
    pub fn last_opened(&self) -> Option<u32> {
        self.opened.last().map(|(id, _)| *id)
    }
}

pub(super) type Shared<T> = Arc<Mutex<T>>;

pub(super) struct FakeBackend {
    pub log: Shared<BackendLog>,
}

pub(super) struct FakeDecoder {
    id: u32,
    log: Shared<BackendLog>,
}

impl AudioBackend for FakeBackend {
    type Decoder = FakeDecoder;

    fn open(&mut self, source: &SourceLocator) -> Result<FakeDecoder, PlaybackError> {
        let mut log = self.log.lock().unwrap();
        if log.failing.contains(source.path()) {
            return Err(PlaybackError::Decode {
                path: source.path().to_path_buf(),
                reason: "corrupt stream".to_string(),
            });
        }
        let id = log.next_id;
        log.next_id += 1;
        log.opened.push((id, source.path().to_path_buf()));
        log.playing = false;
        log.finished = false;
        log.position = Duration::ZERO;
        Ok(FakeDecoder {
            id,
            log: self.log.clone(),
        })
    }
}

impl Decoder for FakeDecoder {
    fn start(&mut self) {
        self.log.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().playing = false;
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        let mut log = self.log.lock().unwrap();
        log.seeks.push(position);
        // Like a real decoder, a paused handle does not report the new position yet.
        if log.playing {
            log.position = position;
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.lock().unwrap().volume = volume;
    }

    fn position(&self) -> Duration {
        self.log.lock().unwrap().position
    }

    fn is_playing(&self) -> bool {
        let log = self.log.lock().unwrap();
        log.playing && !log.finished
    }

    fn is_finished(&self) -> bool {
        self.log.lock().unwrap().finished
    }

    fn release(self) {
        let mut log = self.log.lock().unwrap();
        log.released.push(self.id);
        log.playing = false;
    }
}

#[derive(Debug)]
pub(super) struct FocusLog {
    pub grant: bool,
    pub requests: usize,
    pub abandons: usize,
}

impl Default for FocusLog {
    fn default() -> Self {
        Self {
            grant: true,
            requests: 0,
            abandons: 0,
        }
    }
}

pub(super) struct FakeFocus(pub Shared<FocusLog>);

impl FocusProvider for FakeFocus {
    fn request(&mut self) -> FocusGrant {
        let mut log = self.0.lock().unwrap();
        log.requests += 1;
        if log.grant {
            FocusGrant::Granted
        } else {
            FocusGrant::Denied
        }
    }

    fn abandon(&mut self) {
        self.0.lock().unwrap().abandons += 1;
    }
}

#[derive(Debug, Default)]
pub(super) struct RouteLog {
    pub watching: bool,
    pub watches: usize,
    pub unwatches: usize,
}

pub(super) struct FakeRoute(pub Shared<RouteLog>);

impl OutputRoute for FakeRoute {
    fn watch(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.watching = true;
        log.watches += 1;
    }

    fn unwatch(&mut self) {
        let mut log = self.0.lock().unwrap();
        log.watching = false;
        log.unwatches += 1;
    }
}

/// Observer forwarding snapshots into a channel; fails once the receiver is gone.
pub(super) fn channel_observer(tx: Sender<PlaybackState>) -> Arc<dyn PlaybackObserver> {
    Arc::new(move |state: &PlaybackState| -> Result<(), ObserverError> {
        tx.send(state.clone())
            .map_err(|_| ObserverError::Disconnected)
    })
}

/// Observer that keeps every snapshot it sees.
#[derive(Default)]
pub(super) struct Recorder(pub Mutex<Vec<PlaybackState>>);

impl Recorder {
    pub fn statuses(&self) -> Vec<Status> {
        self.0.lock().unwrap().iter().map(|s| s.status).collect()
    }

    pub fn last(&self) -> Option<PlaybackState> {
        self.0.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl PlaybackObserver for Recorder {
    fn on_state(&self, state: &PlaybackState) -> Result<(), ObserverError> {
        self.0.lock().unwrap().push(state.clone());
        Ok(())
    }
}

pub(super) fn track_path(id: &str) -> PathBuf {
    PathBuf::from(format!("/music/{id}.mp3"))
}

pub(super) fn catalog() -> LibraryCatalog {
    let entry = |id: &str, title: &str, artist: &str| {
        let mut m = TrackMetadata::new(id, title);
        m.artist = Some(artist.to_string());
        m.duration_ms = 180_000;
        (m, track_path(id))
    };
    LibraryCatalog::from_entries(vec![
        entry("a", "Jazz in Paris", "Media Right Productions"),
        entry("b", "The Coldest Shoulder", "The 126ers"),
        entry("c", "Spring Rain", "Aaron Kenny"),
    ])
}

pub(super) struct Harness {
    pub engine: PlaybackEngine<FakeBackend>,
    pub backend: Shared<BackendLog>,
    pub focus: Shared<FocusLog>,
    pub route: Shared<RouteLog>,
    pub recorder: Arc<Recorder>,
    pub reporter: PlaybackStateReporter,
}

pub(super) const DUCK: f32 = 0.2;

/// Engine over fakes with `queue` already appended.
pub(super) fn harness(queue: &[&str]) -> Harness {
    let backend = Shared::<BackendLog>::default();
    let focus = Shared::<FocusLog>::default();
    let route = Shared::<RouteLog>::default();
    let recorder = Arc::new(Recorder::default());

    let reporter = PlaybackStateReporter::new();
    reporter.subscribe(recorder.clone());

    let mut engine = PlaybackEngine::new(
        FakeBackend {
            log: backend.clone(),
        },
        Arc::new(catalog()),
        AudioFocusArbiter::new(Box::new(FakeFocus(focus.clone())), 1.0, DUCK),
        NoisyOutputMonitor::new(Box::new(FakeRoute(route.clone()))),
        reporter.clone(),
    );
    for id in queue {
        engine.append_queue_item(id);
    }

    Harness {
        engine,
        backend,
        focus,
        route,
        recorder,
        reporter,
    }
}
