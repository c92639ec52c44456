use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment variables
/// (prefix `MEZZO__`), and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MEZZO")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let engine = &self.engine;
        if !(0.0..=1.0).contains(&engine.full_volume) {
            return Err("engine.full_volume must be within 0.0..=1.0".to_string());
        }
        if !(0.0..=engine.full_volume).contains(&engine.duck_volume) {
            return Err("engine.duck_volume must be within 0.0..=engine.full_volume".to_string());
        }
        if engine.tick_ms == 0 {
            return Err("engine.tick_ms must be >= 1".to_string());
        }
        if self.output.route_poll_ms == 0 {
            return Err("output.route_poll_ms must be >= 1".to_string());
        }
        if self.session.bus_suffix.trim().is_empty() {
            return Err("session.bus_suffix must not be empty".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `MEZZO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MEZZO_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/mezzo/config.toml`
/// or `~/.config/mezzo/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("mezzo").join("config.toml"))
}
