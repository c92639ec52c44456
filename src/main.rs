mod catalog;
mod config;
mod control;
mod error;
mod lifecycle;
mod mpris;
mod playback;
mod runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
