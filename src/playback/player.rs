use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::EngineSettings;
use crate::error::PlaybackError;

use super::decoder::AudioBackend;
use super::focus::{FocusChange, FocusProvider};
use super::noisy::OutputRoute;
use super::reporter::{PlaybackObserver, PlaybackStateReporter, SubscriptionId};
use super::state::PlaybackState;
use super::thread::{EngineParts, spawn_engine_thread};
use super::types::EngineCmd;

/// Cloneable entry point into the engine's command channel.
///
/// Signal sources (focus providers, route watchers, decoders) hold one of
/// these and only ever enqueue.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<EngineCmd>,
}

impl EventSender {
    pub fn send(&self, cmd: EngineCmd) -> Result<(), PlaybackError> {
        self.tx.send(cmd).map_err(|_| PlaybackError::Disconnected)
    }

    pub fn focus_changed(&self, change: FocusChange) {
        let _ = self.send(EngineCmd::FocusChanged(change));
    }

    pub fn output_noisy(&self) {
        let _ = self.send(EngineCmd::OutputBecameNoisy);
    }

    /// The decoder ran out of input.
    pub fn decoder_completed(&self) {
        let _ = self.send(EngineCmd::DecoderCompleted);
    }
}

/// Focus provider, route watcher and initial observers, built once the
/// command channel exists.
pub struct Wiring {
    pub focus: Box<dyn FocusProvider>,
    pub route: Box<dyn OutputRoute>,
    /// Subscribed before the engine thread starts, so they see its first
    /// snapshot even if the backend fails right away.
    pub observers: Vec<Arc<dyn PlaybackObserver>>,
}

/// Handle to a running engine thread.
pub struct Player {
    events: EventSender,
    reporter: PlaybackStateReporter,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn spawn<B, F>(
        make_backend: F,
        catalog: Arc<dyn Catalog>,
        settings: EngineSettings,
        wire: impl FnOnce(&EventSender) -> Wiring,
    ) -> Self
    where
        B: AudioBackend + 'static,
        F: FnOnce(EventSender) -> Result<B, PlaybackError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let events = EventSender { tx };
        let reporter = PlaybackStateReporter::new();
        let Wiring {
            focus,
            route,
            observers,
        } = wire(&events);
        for observer in observers {
            reporter.subscribe(observer);
        }

        let parts = EngineParts {
            catalog,
            focus,
            route,
            reporter: reporter.clone(),
            events: events.clone(),
            settings,
        };
        let handle = spawn_engine_thread(make_backend, parts, rx);

        Self {
            events,
            reporter,
            join: Mutex::new(Some(handle)),
        }
    }

    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    pub fn send(&self, cmd: EngineCmd) -> Result<(), PlaybackError> {
        self.events.send(cmd)
    }

    pub fn subscribe(&self, observer: Arc<dyn PlaybackObserver>) -> SubscriptionId {
        let id = self.reporter.subscribe(observer);
        debug!(?id, observers = self.reporter.observer_count(), "playback observer subscribed");
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.reporter.unsubscribe(id)
    }

    /// Most recent snapshot published by the engine.
    pub fn latest(&self) -> Option<PlaybackState> {
        self.reporter.latest()
    }

    /// Stop playback and wait for the engine thread to finish.
    pub fn quit(&self) {
        let _ = self.send(EngineCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
