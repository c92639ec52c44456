use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::control::ControlCmd;

/// Read commands from stdin until EOF, which counts as `quit`.
pub fn spawn_console(tx: Sender<ControlCmd>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ControlCmd>() {
                Ok(cmd) => {
                    if tx.send(cmd).is_err() {
                        return;
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        debug!("console closed");
        let _ = tx.send(ControlCmd::Quit);
    })
}
