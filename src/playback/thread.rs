use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::config::EngineSettings;
use crate::error::PlaybackError;

use super::decoder::AudioBackend;
use super::engine::PlaybackEngine;
use super::focus::{AudioFocusArbiter, FocusProvider};
use super::noisy::{NoisyOutputMonitor, OutputRoute};
use super::player::EventSender;
use super::reporter::PlaybackStateReporter;
use super::state::{PlaybackState, Status};
use super::types::{EngineCmd, PlayOutcome};

/// Everything the engine thread needs besides its backend.
pub(super) struct EngineParts {
    pub catalog: Arc<dyn Catalog>,
    pub focus: Box<dyn FocusProvider>,
    pub route: Box<dyn OutputRoute>,
    pub reporter: PlaybackStateReporter,
    /// Handed to the backend so decoders can report completion.
    pub events: EventSender,
    pub settings: EngineSettings,
}

/// Run the engine on its own thread. The backend is built on that thread
/// because output streams are not always `Send`.
pub(super) fn spawn_engine_thread<B, F>(
    make_backend: F,
    parts: EngineParts,
    rx: Receiver<EngineCmd>,
) -> JoinHandle<()>
where
    B: AudioBackend + 'static,
    F: FnOnce(EventSender) -> Result<B, PlaybackError> + Send + 'static,
{
    thread::spawn(move || {
        let EngineParts {
            catalog,
            focus,
            route,
            reporter,
            events,
            settings,
        } = parts;

        let backend = match make_backend(events) {
            Ok(b) => b,
            Err(e) => {
                error!(error = %e, "cannot start playback engine");
                let mut failed = PlaybackState::new(Status::Stopped, 0);
                failed.error = Some(e.to_string());
                reporter.publish(failed);
                return;
            }
        };

        let arbiter = AudioFocusArbiter::new(focus, settings.full_volume, settings.duck_volume);
        let mut engine = PlaybackEngine::new(
            backend,
            catalog,
            arbiter,
            NoisyOutputMonitor::new(route),
            reporter,
        );
        engine.publish_current();
        info!("engine thread started");

        let tick = Duration::from_millis(settings.tick_ms.max(1));
        loop {
            match rx.recv_timeout(tick) {
                Ok(EngineCmd::Quit) => {
                    engine.stop();
                    break;
                }
                Ok(cmd) => {
                    dispatch(&mut engine, cmd);
                    // A steady stream of commands must not starve completion polling.
                    engine.poll_decoder();
                }
                Err(RecvTimeoutError::Timeout) => engine.poll_decoder(),
                Err(RecvTimeoutError::Disconnected) => {
                    engine.stop();
                    break;
                }
            }
        }
        info!("engine thread exiting");
    })
}

fn dispatch<B: AudioBackend>(engine: &mut PlaybackEngine<B>, cmd: EngineCmd) {
    debug!(?cmd, "engine command");
    let result = match cmd {
        EngineCmd::Prepare => {
            engine.prepare();
            Ok(None)
        }
        EngineCmd::Play => engine.play().map(Some),
        EngineCmd::Pause => {
            engine.pause();
            Ok(None)
        }
        EngineCmd::PlayPause => engine.play_pause().map(Some),
        EngineCmd::Stop => {
            engine.stop();
            Ok(None)
        }
        EngineCmd::SeekTo(ms) => {
            engine.seek_to(ms);
            Ok(None)
        }
        EngineCmd::SeekBy(offset) => {
            engine.seek_by(offset);
            Ok(None)
        }
        EngineCmd::SetVolume(v) => {
            engine.set_volume(v);
            Ok(None)
        }
        EngineCmd::SkipNext => engine.skip_next().map(Some),
        EngineCmd::SkipPrevious => engine.skip_previous().map(Some),
        EngineCmd::Append(id) => {
            engine.append_queue_item(&id);
            Ok(None)
        }
        EngineCmd::Remove(id) => {
            engine.remove_queue_item(&id);
            Ok(None)
        }
        EngineCmd::PlayFromId(id) => engine.play_from_id(&id).map(Some),
        EngineCmd::PlayFromSearch(query) => engine.play_from_search(&query).map(Some),
        EngineCmd::FocusChanged(change) => engine.handle_focus_change(change).map(|_| None),
        EngineCmd::OutputBecameNoisy => {
            engine.handle_noisy_output();
            Ok(None)
        }
        EngineCmd::DecoderCompleted => {
            engine.handle_completion();
            Ok(None)
        }
        EngineCmd::Quit => Ok(None),
    };

    match result {
        Ok(Some(outcome @ (PlayOutcome::FocusDenied | PlayOutcome::UnknownTrack))) => {
            info!(?outcome, "playback not started");
        }
        Ok(Some(outcome)) => debug!(?outcome, "command done"),
        Ok(None) => {}
        // Already reported to observers as a failed `Stopped` state.
        Err(e) => warn!(error = %e, "command failed"),
    }
}
