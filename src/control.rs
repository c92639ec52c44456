//! Commands accepted by the runtime, from the console or the session bus.

use std::str::FromStr;

use thiserror::Error;

use crate::playback::{EngineCmd, FocusChange};

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCmd {
    /// Forward straight to the engine thread.
    Engine(EngineCmd),
    /// Simulate another focus client doing something.
    Focus(FocusChange),
    /// Simulate the output route going away.
    Noisy,
    List,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid argument for `{cmd}`: {arg}")]
    InvalidArgument { cmd: &'static str, arg: String },
}

pub const HELP: &str = "\
commands:
  play | pause | toggle | stop | next | prev
  seek <ms>          absolute position; +ms / -ms is relative
  vol <0.0-1.0>
  add <id> | rm <id> | playid <id> | search <query>
  focus <gain|duck|transient|loss>
  noisy | list | status | help | quit";

impl FromStr for ControlCmd {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let arg = |cmd: &'static str| {
            if rest.is_empty() {
                Err(ParseCommandError::MissingArgument(cmd))
            } else {
                Ok(rest.to_string())
            }
        };
        let invalid = |cmd: &'static str| ParseCommandError::InvalidArgument {
            cmd,
            arg: rest.to_string(),
        };

        let engine = |cmd: EngineCmd| -> Result<Self, ParseCommandError> {
            Ok(ControlCmd::Engine(cmd))
        };
        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseCommandError::Empty),
            "play" => engine(EngineCmd::Play),
            "pause" => engine(EngineCmd::Pause),
            "toggle" => engine(EngineCmd::PlayPause),
            "stop" => engine(EngineCmd::Stop),
            "next" => engine(EngineCmd::SkipNext),
            "prev" => engine(EngineCmd::SkipPrevious),
            "seek" => {
                let raw = arg("seek")?;
                if raw.starts_with(['+', '-']) {
                    let offset = raw.parse::<i64>().map_err(|_| invalid("seek"))?;
                    engine(EngineCmd::SeekBy(offset))
                } else {
                    let ms = raw.parse::<u64>().map_err(|_| invalid("seek"))?;
                    engine(EngineCmd::SeekTo(ms))
                }
            }
            "vol" | "volume" => {
                let level = arg("vol")?
                    .parse::<f32>()
                    .ok()
                    .filter(|v| (0.0..=1.0).contains(v))
                    .ok_or_else(|| invalid("vol"))?;
                engine(EngineCmd::SetVolume(level))
            }
            "add" => engine(EngineCmd::Append(arg("add")?)),
            "rm" => engine(EngineCmd::Remove(arg("rm")?)),
            "playid" => engine(EngineCmd::PlayFromId(arg("playid")?)),
            "search" => engine(EngineCmd::PlayFromSearch(arg("search")?)),
            "focus" => {
                let change = match arg("focus")?.to_ascii_lowercase().as_str() {
                    "gain" => FocusChange::Gain,
                    "duck" => FocusChange::LossTransientCanDuck,
                    "transient" => FocusChange::LossTransient,
                    "loss" => FocusChange::Loss,
                    _ => return Err(invalid("focus")),
                };
                Ok(ControlCmd::Focus(change))
            }
            "noisy" => Ok(ControlCmd::Noisy),
            "list" | "ls" => Ok(ControlCmd::List),
            "status" => Ok(ControlCmd::Status),
            "help" | "?" => Ok(ControlCmd::Help),
            "quit" | "q" | "exit" => Ok(ControlCmd::Quit),
            _ => Err(ParseCommandError::Unknown(word.to_string())),
        }
    }
}
