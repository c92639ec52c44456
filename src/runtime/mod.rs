use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use tracing::{info, warn};

use crate::control::ControlCmd;

mod console;
mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();
    settings::init_logging(&settings.logging);
    if let Some(msg) = problem {
        warn!("{msg}");
    }

    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.library.dir.clone())
        .map_or_else(env::current_dir, Ok)?;

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mut session = startup::start(&settings, &dir, &control_tx);
    console::spawn_console(control_tx);

    event_loop::run(&mut session, &control_rx);

    session.player.quit();
    info!("bye");
    Ok(())
}
