use std::path::PathBuf;

use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/mezzo/config.toml` or `~/.config/mezzo/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MEZZO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub library: LibrarySettings,
    pub output: OutputSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Volume restored when full audio focus comes back.
    pub full_volume: f32,
    /// Volume used while another client holds focus with ducking allowed.
    pub duck_volume: f32,
    /// How often the engine thread checks the decoder for end-of-stream (milliseconds).
    pub tick_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            full_volume: 1.0,
            duck_volume: 0.2,
            tick_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory scanned when none is given on the command line.
    pub dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            dir: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Pause when the default output device changes (e.g. headphones unplugged).
    pub watch_route: bool,
    /// Polling interval for the output device watcher (milliseconds).
    pub route_poll_ms: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            watch_route: true,
            route_poll_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Expose the engine on the session bus as an MPRIS player.
    pub mpris: bool,
    /// Suffix of the bus name, `org.mpris.MediaPlayer2.<suffix>`.
    pub bus_suffix: String,
    /// Exit the process once playback reaches `Stopped`.
    pub exit_when_stopped: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mpris: true,
            bus_suffix: "mezzo".to_string(),
            exit_when_stopped: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
