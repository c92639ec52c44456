//! Error types shared across the engine, the catalog and observers.
//!
//! Policy rejections (focus denied, empty queue, unknown track) are not
//! errors; they are reported through `PlayOutcome`. Everything here is a
//! real failure the caller has to surface.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No output device could be opened.
    #[error("no audio output device: {0}")]
    OutputUnavailable(String),

    /// The source file backing a track could not be opened.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source opened but could not be decoded.
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("seek failed: {0}")]
    Seek(String),

    /// The engine thread has exited and no longer accepts commands.
    #[error("engine thread is gone")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown media id: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// The receiving side of an observer went away.
    #[error("observer disconnected")]
    Disconnected,

    #[error("observer failed: {0}")]
    Failed(String),
}
