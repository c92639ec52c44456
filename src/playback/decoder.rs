//! Decoder capability interface.
//!
//! The state machine in `engine` is written once against these traits; a
//! backend only has to know how to open a source and drive one handle.

use std::time::Duration;

use crate::catalog::SourceLocator;
use crate::error::PlaybackError;

/// Factory for decoder handles. Lives on the engine thread.
pub trait AudioBackend {
    type Decoder: Decoder;

    /// Open `source` and return a paused handle positioned at the start.
    fn open(&mut self, source: &SourceLocator) -> Result<Self::Decoder, PlaybackError>;
}

/// One live decoding + output handle.
pub trait Decoder {
    fn start(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;

    fn set_volume(&mut self, volume: f32);

    fn position(&self) -> Duration;

    fn is_playing(&self) -> bool;

    /// True once the source has been played to its end.
    fn is_finished(&self) -> bool;

    /// Tear down the handle. It cannot be used afterwards.
    fn release(self);
}
