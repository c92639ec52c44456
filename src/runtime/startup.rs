use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{Catalog, LibraryCatalog, scan};
use crate::config;
use crate::control::ControlCmd;
use crate::lifecycle::{LifecycleTransition, ServiceLifecycle};
use crate::playback::{
    BrokerClient, DefaultDeviceWatcher, EngineCmd, FocusBroker, FocusChange, FocusKind,
    FocusProvider, NullRoute, OutputRoute, PlaybackObserver, Player, RodioBackend, Wiring,
};

/// Everything the event loop drives.
pub struct Session {
    pub player: Player,
    pub catalog: Arc<LibraryCatalog>,
    pub peers: FocusPeers,
}

/// Other focus clients on the shared broker, poked from the console to
/// exercise the player's focus handling.
pub struct FocusPeers {
    /// Takes focus for good.
    takeover: BrokerClient,
    /// Short exclusive interruption.
    alert: BrokerClient,
    /// Short interruption that lets the player duck.
    prompt: BrokerClient,
}

impl FocusPeers {
    fn new(broker: &FocusBroker) -> Self {
        let peer = |kind: FocusKind| {
            broker.client(kind, move |change| debug!(?kind, ?change, "focus peer notified"))
        };
        Self {
            takeover: peer(FocusKind::Gain),
            alert: peer(FocusKind::Transient),
            prompt: peer(FocusKind::TransientMayDuck),
        }
    }

    /// Make the broker send `change` to the player.
    pub fn simulate(&mut self, change: FocusChange) {
        match change {
            FocusChange::Gain => {
                self.alert.abandon();
                self.prompt.abandon();
                self.takeover.abandon();
            }
            FocusChange::LossTransientCanDuck => {
                self.prompt.request();
            }
            FocusChange::LossTransient => {
                self.alert.request();
            }
            FocusChange::Loss => {
                self.takeover.request();
            }
        }
    }
}

pub fn start(settings: &config::Settings, dir: &Path, control_tx: &Sender<ControlCmd>) -> Session {
    let catalog = Arc::new(scan(dir, &settings.library));
    let broker = FocusBroker::new();
    let output = settings.output.clone();

    let shared: Arc<dyn Catalog> = catalog.clone();
    let player = Player::spawn(
        RodioBackend::open_default,
        shared,
        settings.engine.clone(),
        |events| {
            let ev = events.clone();
            let focus = broker.client(FocusKind::Gain, move |change| ev.focus_changed(change));

            let route: Box<dyn OutputRoute> = if output.watch_route {
                let ev = events.clone();
                Box::new(DefaultDeviceWatcher::new(
                    Duration::from_millis(output.route_poll_ms),
                    Arc::new(move || ev.output_noisy()),
                ))
            } else {
                Box::new(NullRoute)
            };

            let mut observers: Vec<Arc<dyn PlaybackObserver>> =
                vec![Arc::new(lifecycle(settings, control_tx.clone()))];
            if settings.session.mpris {
                let bus_suffix = &settings.session.bus_suffix;
                observers.push(Arc::new(crate::mpris::spawn_mpris(control_tx.clone(), bus_suffix)));
            }

            Wiring {
                focus: Box::new(focus),
                route,
                observers,
            }
        },
    );

    for id in catalog.ids() {
        let _ = player.send(EngineCmd::Append(id.to_string()));
    }
    let _ = player.send(EngineCmd::Prepare);
    info!(tracks = catalog.len(), dir = %dir.display(), "library queued");

    Session {
        player,
        catalog,
        peers: FocusPeers::new(&broker),
    }
}

fn lifecycle(settings: &config::Settings, control_tx: Sender<ControlCmd>) -> ServiceLifecycle {
    let exit_when_stopped = settings.session.exit_when_stopped;
    ServiceLifecycle::new(move |transition, state| match transition {
        LifecycleTransition::StartForeground | LifecycleTransition::RefreshNotification => {
            if let Some(track) = &state.track {
                println!("{:?}: {}", state.status, track.display());
            }
        }
        LifecycleTransition::LeaveForeground => {
            if let Some(e) = &state.error {
                println!("stopped: {e}");
            }
            if exit_when_stopped {
                let _ = control_tx.send(ControlCmd::Quit);
            }
        }
    })
}
