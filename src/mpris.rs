use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::control::ControlCmd;
use crate::error::ObserverError;
use crate::playback::{Actions, EngineCmd, PlaybackObserver, PlaybackState, Status};

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_PATH_PREFIX: &str = "/org/mezzo/track/";
const SIGNAL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct SharedState {
    latest: PlaybackState,
}

/// Playback observer feeding the D-Bus service thread.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl PlaybackObserver for MprisHandle {
    fn on_state(&self, state: &PlaybackState) -> Result<(), ObserverError> {
        if let Ok(mut s) = self.state.lock() {
            s.latest = state.clone();
        }
        // The service thread is gone once the bus connection failed.
        self.notify.send(()).map_err(|_| ObserverError::Disconnected)
    }
}

/// D-Bus object path for a media id. Ids are paths, so anything outside
/// `[A-Za-z0-9_]` is replaced.
fn track_object_path(media_id: &str) -> Option<ObjectPath<'static>> {
    let element: String = media_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let element = if element.is_empty() { "_".to_string() } else { element };
    ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}{element}")).ok()
}

fn owned<'a>(value: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(value.into()).ok()
}

fn micros(ms: u64) -> i64 {
    i64::try_from(ms.saturating_mul(1000)).unwrap_or(i64::MAX)
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "mezzo"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: EngineCmd) {
        let _ = self.tx.send(ControlCmd::Engine(cmd));
    }

    fn snapshot(&self) -> PlaybackState {
        self.state
            .lock()
            .map(|s| s.latest.clone())
            .unwrap_or_default()
    }

    fn allows(&self, action: Actions) -> bool {
        self.snapshot().actions.contains(action)
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(EngineCmd::SkipNext);
    }

    fn previous(&self) {
        self.send(EngineCmd::SkipPrevious);
    }

    fn play(&self) {
        self.send(EngineCmd::Play);
    }

    fn pause(&self) {
        self.send(EngineCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(EngineCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(EngineCmd::Stop);
    }

    /// Relative seek, `offset` in microseconds.
    fn seek(&self, offset: i64) {
        self.send(EngineCmd::SeekBy(offset / 1000));
    }

    /// Absolute seek; ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        let current = self
            .snapshot()
            .track
            .and_then(|t| track_object_path(&t.id));
        if position < 0 || current.as_ref() != Some(&*track_id) {
            debug!(track_id = %track_id.as_str(), position, "ignoring stale SetPosition");
            return;
        }
        self.send(EngineCmd::SeekTo(position as u64 / 1000));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.snapshot().status {
            Status::Playing => "Playing",
            Status::Paused => "Paused",
            Status::Idle | Status::Preparing | Status::Stopped => "Stopped",
        }
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        f64::from(self.snapshot().rate)
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        f64::from(self.snapshot().volume)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        self.send(EngineCmd::SetVolume(volume.clamp(0.0, 1.0) as f32));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        micros(self.snapshot().position_at(Instant::now()))
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.allows(Actions::PLAY)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.allows(Actions::PAUSE)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.allows(Actions::SEEK_TO)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.allows(Actions::SKIP_TO_NEXT)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.allows(Actions::SKIP_TO_PREVIOUS)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Some(track) = self.snapshot().track else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };
        put("mpris:trackid", track_object_path(&track.id).and_then(|p| owned(p)));
        put("xesam:title", owned(track.title.clone()));
        if let Some(artist) = &track.artist {
            put("xesam:artist", owned(vec![artist.clone()]));
        }
        if let Some(album) = &track.album {
            put("xesam:album", owned(album.clone()));
        }
        if let Some(genre) = &track.genre {
            put("xesam:genre", owned(vec![genre.clone()]));
        }
        if track.duration_ms > 0 {
            put("mpris:length", owned(micros(track.duration_ms)));
        }
        if let Some(art) = &track.artwork {
            put("mpris:artUrl", owned(format!("file://{}", art.display())));
        }
        map
    }
}

async fn emit_changes(iface_ref: &zbus::object_server::InterfaceRef<PlayerIface>) {
    let emitter = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    let results = [
        iface.playback_status_changed(emitter).await,
        iface.metadata_changed(emitter).await,
        iface.volume_changed(emitter).await,
        iface.can_play_changed(emitter).await,
        iface.can_pause_changed(emitter).await,
        iface.can_seek_changed(emitter).await,
    ];
    for e in results.into_iter().filter_map(Result::err) {
        warn!(error = %e, "MPRIS: failed to emit PropertiesChanged");
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
    bus_name: String,
) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "MPRIS: failed to connect to session bus");
            return;
        }
    };

    if let Err(e) = connection.request_name(bus_name.as_str()).await {
        warn!(error = %e, name = %bus_name, "MPRIS: failed to acquire name");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server.at(MPRIS_PATH, RootIface { tx: tx.clone() }).await {
        warn!(error = %e, "MPRIS: failed to register root iface");
        return;
    }
    if let Err(e) = object_server.at(MPRIS_PATH, PlayerIface { tx, state }).await {
        warn!(error = %e, "MPRIS: failed to register player iface");
        return;
    }
    let iface_ref = match object_server.interface::<_, PlayerIface>(MPRIS_PATH).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "MPRIS: player iface not found after registration");
            return;
        }
    };
    info!(name = %bus_name, "MPRIS service registered");

    // Coalesce bursts of state changes into one round of signals.
    loop {
        Timer::after(SIGNAL_INTERVAL).await;
        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
        if changed {
            emit_changes(&iface_ref).await;
        }
    }
}

/// Start the MPRIS service on its own thread, registered as
/// `org.mpris.MediaPlayer2.<bus_suffix>`.
pub fn spawn_mpris(tx: Sender<ControlCmd>, bus_suffix: &str) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();
    let bus_name = format!("org.mpris.MediaPlayer2.{bus_suffix}");

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx, bus_name));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
