use std::sync::mpsc::Receiver;
use std::time::Instant;

use tracing::{info, warn};

use crate::control::{ControlCmd, HELP};
use crate::playback::PlaybackState;
use crate::runtime::startup::Session;

/// Dispatch control commands until `quit`. Returns once the engine is gone
/// or shutdown was requested.
pub fn run(session: &mut Session, control_rx: &Receiver<ControlCmd>) {
    while let Ok(cmd) = control_rx.recv() {
        match cmd {
            ControlCmd::Quit => {
                info!("quit requested");
                break;
            }
            ControlCmd::Engine(cmd) => {
                if let Err(e) = session.player.send(cmd) {
                    warn!(error = %e, "engine is no longer running");
                    break;
                }
            }
            ControlCmd::Focus(change) => session.peers.simulate(change),
            ControlCmd::Noisy => session.player.events().output_noisy(),
            ControlCmd::List => {
                println!("{} ({} tracks)", session.catalog.root(), session.catalog.len());
                for track in session.catalog.items() {
                    println!("  {}  {}", track.id, track.display());
                }
            }
            ControlCmd::Status => match session.player.latest() {
                Some(state) => println!("{}", describe(&state)),
                None => println!("no state yet"),
            },
            ControlCmd::Help => println!("{HELP}"),
        }
    }
}

fn describe(state: &PlaybackState) -> String {
    let secs = state.position_at(Instant::now()) / 1000;
    let mut line = format!(
        "{:?} {}:{:02} vol {:.2}",
        state.status,
        secs / 60,
        secs % 60,
        state.volume
    );
    if let Some(track) = &state.track {
        line.push_str(&format!(" | {}", track.display()));
    }
    if let Some(e) = &state.error {
        line.push_str(&format!(" | error: {e}"));
    }
    line
}
