//! The playback state machine.
//!
//! `PlaybackEngine` owns the decoder handle, the queue, the focus arbiter and
//! the noisy-output monitor. It is driven from a single thread (see
//! `thread.rs`); every method assumes exclusive access.
//!
//! ```text
//! Idle -> Preparing -> Playing <-> Paused
//!   any state -> Stopped
//! ```
//!
//! `Stopped` is the resting state once the decoder is released; the next
//! `play` goes through `Preparing` again. `Idle` only precedes the first one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, SourceLocator, TrackMetadata};
use crate::error::PlaybackError;

use super::decoder::{AudioBackend, Decoder};
use super::focus::{AudioFocusArbiter, FocusAction, FocusChange};
use super::noisy::NoisyOutputMonitor;
use super::queue::QueueManager;
use super::reporter::PlaybackStateReporter;
use super::state::{Actions, PlaybackState, Status};
use super::types::{PauseCause, PlayOutcome};

pub struct PlaybackEngine<B: AudioBackend> {
    backend: B,
    catalog: Arc<dyn Catalog>,
    queue: QueueManager,
    focus: AudioFocusArbiter,
    noisy: NoisyOutputMonitor,
    reporter: PlaybackStateReporter,

    decoder: Option<B::Decoder>,
    loaded_source: Option<SourceLocator>,
    /// Media id the open decoder belongs to.
    loaded_id: Option<String>,
    prepared: Option<Arc<TrackMetadata>>,
    status: Status,
    volume: f32,

    /// The loaded source ran to its end (or was stopped) and must be reopened.
    played_to_completion: bool,
    /// Seek target reported while the decoder is not playing.
    seek_while_not_playing: Option<u64>,
}

impl<B: AudioBackend> PlaybackEngine<B> {
    pub fn new(
        backend: B,
        catalog: Arc<dyn Catalog>,
        focus: AudioFocusArbiter,
        noisy: NoisyOutputMonitor,
        reporter: PlaybackStateReporter,
    ) -> Self {
        let volume = focus.full_volume();
        Self {
            backend,
            catalog,
            queue: QueueManager::new(),
            focus,
            noisy,
            reporter,
            decoder: None,
            loaded_source: None,
            loaded_id: None,
            prepared: None,
            status: Status::Idle,
            volume,
            played_to_completion: false,
            seek_while_not_playing: None,
        }
    }

    pub fn append_queue_item(&mut self, media_id: &str) {
        self.queue.append(media_id);
        debug!(media_id, len = self.queue.len(), "queued");
    }

    pub fn remove_queue_item(&mut self, media_id: &str) -> bool {
        let removed = self.queue.remove(media_id);
        debug!(media_id, removed, len = self.queue.len(), "dequeued");
        removed
    }

    /// Resolve metadata for the current queue item and move to `Preparing`.
    ///
    /// Output that was playing is paused and focus given back, since nothing
    /// has asked to play the prepared track yet. Returns false when there is
    /// nothing to prepare.
    pub fn prepare(&mut self) -> bool {
        let was_playing = self.status == Status::Playing;
        let prepared = self.prepare_current();
        if prepared && was_playing {
            self.focus.abandon();
        }
        prepared
    }

    fn prepare_current(&mut self) -> bool {
        let Some(item) = self.queue.current() else {
            debug!("prepare: queue is empty");
            return false;
        };
        let media_id = item.media_id.clone();

        let metadata = match self.catalog.metadata(&media_id) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(media_id = %media_id, error = %e, "prepare: cannot resolve track");
                return false;
            }
        };
        if !matches!(&self.prepared, Some(t) if t.id == metadata.id) {
            // A seek cached for the previous track does not carry over.
            self.seek_while_not_playing = None;
        }
        self.prepared = Some(Arc::new(metadata));
        self.quiesce();
        self.set_state(Status::Preparing);
        true
    }

    pub fn play(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if self.queue.is_empty() {
            debug!("play: queue is empty");
            return Ok(PlayOutcome::NothingToPlay);
        }
        if self.prepared.is_none() && !self.prepare_current() {
            return Ok(PlayOutcome::UnknownTrack);
        }
        let Some(track) = self.prepared.clone() else {
            return Ok(PlayOutcome::UnknownTrack);
        };
        let source = match self.catalog.source(&track.id) {
            Ok(source) => source,
            Err(e) => {
                warn!(media_id = %track.id, error = %e, "play: cannot resolve source");
                return Ok(PlayOutcome::UnknownTrack);
            }
        };

        let reload = self.decoder.is_none()
            || self.played_to_completion
            || self.loaded_source.as_ref() != Some(&source);

        if !reload && self.status == Status::Playing {
            return Ok(PlayOutcome::AlreadyPlaying);
        }

        if !self.focus.request() {
            info!(media_id = %track.id, "play: audio focus denied");
            return Ok(PlayOutcome::FocusDenied);
        }

        if reload {
            self.release_decoder();
            self.played_to_completion = false;
            self.seek_while_not_playing = None;

            let mut decoder = match self.backend.open(&source) {
                Ok(decoder) => decoder,
                Err(e) => {
                    self.fail(&e);
                    return Err(e);
                }
            };
            decoder.set_volume(self.volume);
            self.decoder = Some(decoder);
            self.loaded_source = Some(source);
            self.loaded_id = Some(track.id.clone());
            info!(media_id = %track.id, title = %track.title, "loaded track");
        }

        self.noisy.register();
        if let Some(decoder) = self.decoder.as_mut() {
            if !decoder.is_playing() {
                decoder.start();
            }
        }
        self.set_state(Status::Playing);

        Ok(if reload {
            PlayOutcome::Started
        } else {
            PlayOutcome::Resumed
        })
    }

    pub fn pause(&mut self) -> bool {
        self.pause_with(PauseCause::User)
    }

    /// Pause output if playing. Focus is kept only when focus loss caused the pause.
    pub fn pause_with(&mut self, cause: PauseCause) -> bool {
        if self.status != Status::Playing {
            return false;
        }
        if cause != PauseCause::FocusLoss {
            self.focus.abandon();
        }
        self.noisy.unregister();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.pause();
        }
        debug!(?cause, "paused");
        self.set_state(Status::Paused);
        true
    }

    pub fn play_pause(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if self.status == Status::Playing {
            self.pause();
            Ok(PlayOutcome::Paused)
        } else {
            self.play()
        }
    }

    /// Stop from any state. Observers always get a `Stopped` snapshot.
    pub fn stop(&mut self) {
        self.focus.abandon();
        self.noisy.unregister();
        self.played_to_completion = true;
        self.set_state(Status::Stopped);
        self.release_decoder();
        self.seek_while_not_playing = None;
    }

    pub fn seek_to(&mut self, position_ms: u64) {
        let Some(decoder) = self.decoder.as_mut() else {
            debug!(position_ms, "seek ignored: nothing loaded");
            return;
        };
        if self.status != Status::Playing {
            self.seek_while_not_playing = Some(position_ms);
        }
        if let Err(e) = decoder.seek(Duration::from_millis(position_ms)) {
            warn!(position_ms, error = %e, "seek failed");
        }
        // Same status, new position.
        self.set_state(self.status);
    }

    pub fn seek_by(&mut self, offset_ms: i64) {
        let target = self.current_position_ms().saturating_add_signed(offset_ms);
        self.seek_to(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.set_volume(self.volume);
        }
    }

    pub fn skip_next(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if self.queue.next().is_none() {
            return Ok(PlayOutcome::NothingToPlay);
        }
        self.play_current()
    }

    pub fn skip_previous(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if self.queue.previous().is_none() {
            return Ok(PlayOutcome::NothingToPlay);
        }
        self.play_current()
    }

    /// Prepare and play whatever the queue cursor now points at.
    fn play_current(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if !self.prepare_current() {
            self.prepared = None;
            return Ok(PlayOutcome::UnknownTrack);
        }
        let outcome = self.play()?;
        if outcome == PlayOutcome::FocusDenied {
            // The previous track is already paused; do not keep its focus either.
            self.focus.abandon();
        }
        Ok(outcome)
    }

    /// Play `media_id`, jumping to its queue entry or appending it.
    pub fn play_from_id(&mut self, media_id: &str) -> Result<PlayOutcome, PlaybackError> {
        if let Err(e) = self.catalog.metadata(media_id) {
            info!(media_id, error = %e, "play_from_id: unknown track");
            return Ok(PlayOutcome::UnknownTrack);
        }
        let index = match self.queue.position_of(media_id) {
            Some(i) => i,
            None => {
                self.queue.append(media_id);
                self.queue.len() - 1
            }
        };
        self.queue.select(index);
        self.play_current()
    }

    pub fn play_from_search(&mut self, query: &str) -> Result<PlayOutcome, PlaybackError> {
        match self.catalog.search(query) {
            Some(found) => self.play_from_id(&found.id),
            None => {
                info!(query, "play_from_search: no match");
                Ok(PlayOutcome::UnknownTrack)
            }
        }
    }

    pub fn handle_focus_change(&mut self, change: FocusChange) -> Result<(), PlaybackError> {
        let playing = self.status == Status::Playing;
        match self.focus.on_focus_change(change, playing) {
            Some(FocusAction::Resume) => {
                // A duck may have preceded the transient loss.
                self.set_volume(self.focus.full_volume());
                self.play()?;
            }
            Some(FocusAction::SetVolume(v)) => self.set_volume(v),
            Some(FocusAction::Pause) => {
                self.pause_with(PauseCause::FocusLoss);
            }
            Some(FocusAction::Stop) => self.stop(),
            None => {}
        }
        Ok(())
    }

    pub fn handle_noisy_output(&mut self) {
        if self.noisy.is_registered() && self.status == Status::Playing {
            info!("output route changed, pausing");
            self.pause_with(PauseCause::NoisyOutput);
        }
    }

    /// The decoder reached end-of-stream.
    pub fn handle_completion(&mut self) {
        if self.status != Status::Playing {
            return;
        }
        // A completion queued by a decoder that has since been replaced.
        if !self.decoder.as_ref().is_some_and(|d| d.is_finished()) {
            debug!("ignoring completion from a stale decoder");
            return;
        }
        info!(
            media_id = self.prepared.as_ref().map(|t| t.id.as_str()),
            "played to completion"
        );
        self.played_to_completion = true;
        self.noisy.unregister();
        // Paused: the handle still accepts seek/start, unlike a stopped one.
        self.set_state(Status::Paused);
    }

    /// Periodic check for backends that only expose completion by polling.
    pub fn poll_decoder(&mut self) {
        let finished = self.decoder.as_ref().is_some_and(|d| d.is_finished());
        if finished {
            self.handle_completion();
        }
    }

    /// Re-publish the current state, e.g. for observers that joined late.
    pub fn publish_current(&mut self) {
        self.set_state(self.status);
    }

    /// Silence a playing decoder before the engine leaves `Playing` for
    /// another state. Focus is left to the caller.
    fn quiesce(&mut self) {
        if self.status != Status::Playing {
            return;
        }
        self.noisy.unregister();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.pause();
        }
    }

    fn current_position_ms(&self) -> u64 {
        if let Some(p) = self.seek_while_not_playing {
            return p;
        }
        // Position of the prepared track; a decoder left over from the
        // previous one does not count.
        match (&self.decoder, &self.prepared) {
            (Some(d), Some(t)) if self.loaded_id.as_deref() == Some(t.id.as_str()) => {
                d.position().as_millis() as u64
            }
            _ => 0,
        }
    }

    fn release_decoder(&mut self) {
        self.loaded_id = None;
        if let Some(decoder) = self.decoder.take() {
            decoder.release();
            debug!("decoder released");
        }
    }

    /// A resource failure ends the attempt: release everything and report it.
    fn fail(&mut self, e: &PlaybackError) {
        error!(error = %e, "playback failed");
        self.release_decoder();
        self.loaded_source = None;
        self.noisy.unregister();
        self.focus.abandon();
        self.status = Status::Stopped;
        let mut snapshot = self.snapshot();
        snapshot.error = Some(e.to_string());
        self.reporter.publish(snapshot);
    }

    fn set_state(&mut self, status: Status) {
        if status != self.status {
            debug!(from = ?self.status, to = ?status, "state transition");
        }
        self.status = status;
        let snapshot = self.snapshot();
        self.reporter.publish(snapshot);
    }

    fn snapshot(&mut self) -> PlaybackState {
        let position_ms = match self.seek_while_not_playing {
            Some(p) => {
                // Once playing, the decoder reports the committed position itself.
                if self.status == Status::Playing {
                    self.seek_while_not_playing = None;
                }
                p
            }
            None => self.current_position_ms(),
        };

        PlaybackState {
            status: self.status,
            position_ms,
            rate: 1.0,
            volume: self.volume,
            updated_at: Instant::now(),
            actions: Actions::for_status(self.status),
            track: self.prepared.clone(),
            error: None,
        }
    }
}

/// Inspection hooks for the tests.
#[cfg(test)]
impl<B: AudioBackend> PlaybackEngine<B> {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn focus_state(&self) -> super::focus::FocusState {
        self.focus.state()
    }

    pub fn was_interrupted(&self) -> bool {
        self.focus.was_interrupted()
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub fn is_route_registered(&self) -> bool {
        self.noisy.is_registered()
    }

    pub fn prepared(&self) -> Option<&TrackMetadata> {
        self.prepared.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }
}
