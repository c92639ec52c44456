//! `rodio`-backed decoder: one paused `Sink` per opened source.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::catalog::SourceLocator;
use crate::error::PlaybackError;

use super::decoder::{AudioBackend, Decoder};
use super::player::EventSender;

pub struct RodioBackend {
    stream: OutputStream,
    events: EventSender,
}

impl RodioBackend {
    /// Open the default output device. Completion of every opened source is
    /// reported through `events`.
    pub fn open_default(events: EventSender) -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped.
        stream.log_on_drop(false);
        Ok(Self { stream, events })
    }
}

impl AudioBackend for RodioBackend {
    type Decoder = RodioDecoder;

    fn open(&mut self, source: &SourceLocator) -> Result<RodioDecoder, PlaybackError> {
        let path = source.path();
        let file = File::open(path).map_err(|e| PlaybackError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let decoded =
            rodio::Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let ended = Arc::new(AtomicBool::new(false));
        let flag = ended.clone();
        let events = self.events.clone();

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(decoded);
        // Runs on the mixer thread once the decoded source is exhausted.
        sink.append(EmptyCallback::new(Box::new(move || {
            flag.store(true, Ordering::Release);
            events.decoder_completed();
        })));
        sink.pause();
        Ok(RodioDecoder { sink, ended })
    }
}

pub struct RodioDecoder {
    sink: Sink,
    ended: Arc<AtomicBool>,
}

impl Decoder for RodioDecoder {
    fn start(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.is_finished()
    }

    fn is_finished(&self) -> bool {
        self.ended.load(Ordering::Acquire) || self.sink.empty()
    }

    fn release(self) {
        self.sink.stop();
    }
}
