//! Commands and small result types used by the playback subsystem.

use super::focus::FocusChange;

/// Message consumed by the engine thread.
///
/// User commands and external signals share this one channel so the engine
/// applies them strictly one after another.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCmd {
    /// Resolve metadata for the current queue item.
    Prepare,
    Play,
    Pause,
    /// Pause when playing, play otherwise.
    PlayPause,
    Stop,
    /// Seek to an absolute position in milliseconds.
    SeekTo(u64),
    /// Seek relative to the current position, in milliseconds.
    SeekBy(i64),
    SetVolume(f32),
    SkipNext,
    SkipPrevious,
    Append(String),
    Remove(String),
    PlayFromId(String),
    PlayFromSearch(String),
    /// Focus change delivered by the focus provider.
    FocusChanged(FocusChange),
    /// The output route went away.
    OutputBecameNoisy,
    /// The decoder reached the end of its source.
    DecoderCompleted,
    /// Stop playback and end the engine thread.
    Quit,
}

/// Result of a command that may legitimately decline to start playback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A new decoder was opened and output started.
    Started,
    /// The existing decoder picked up where it left off.
    Resumed,
    AlreadyPlaying,
    Paused,
    /// Focus was refused; nothing changed.
    FocusDenied,
    /// The queue is empty.
    NothingToPlay,
    /// The catalog does not know the requested track.
    UnknownTrack,
}

/// Why playback is being paused. Only focus loss keeps focus held.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PauseCause {
    User,
    FocusLoss,
    NoisyOutput,
}
