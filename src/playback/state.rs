//! Published playback snapshots and the capability bitmask they carry.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::TrackMetadata;

/// Engine state machine position.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Idle,
    Preparing,
    Playing,
    Paused,
    Stopped,
}

/// Capabilities advertised to remote controllers.
///
/// Advisory only: the engine does not refuse a command because its bit is missing.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Actions(u32);

impl Actions {
    pub const PLAY: Self = Self(1 << 0);
    pub const PAUSE: Self = Self(1 << 1);
    pub const STOP: Self = Self(1 << 2);
    pub const PLAY_PAUSE: Self = Self(1 << 3);
    pub const SEEK_TO: Self = Self(1 << 4);
    pub const SKIP_TO_NEXT: Self = Self(1 << 5);
    pub const SKIP_TO_PREVIOUS: Self = Self(1 << 6);
    pub const PLAY_FROM_ID: Self = Self(1 << 7);
    pub const PLAY_FROM_SEARCH: Self = Self(1 << 8);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::PLAY, "play"),
        (Self::PAUSE, "pause"),
        (Self::STOP, "stop"),
        (Self::PLAY_PAUSE, "play-pause"),
        (Self::SEEK_TO, "seek-to"),
        (Self::SKIP_TO_NEXT, "skip-to-next"),
        (Self::SKIP_TO_PREVIOUS, "skip-to-previous"),
        (Self::PLAY_FROM_ID, "play-from-id"),
        (Self::PLAY_FROM_SEARCH, "play-from-search"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Capability set derived purely from `status`.
    pub fn for_status(status: Status) -> Self {
        let always = Self::PLAY_FROM_ID
            | Self::PLAY_FROM_SEARCH
            | Self::SKIP_TO_NEXT
            | Self::SKIP_TO_PREVIOUS;
        let by_state = match status {
            Status::Stopped => Self::PLAY | Self::PAUSE,
            Status::Playing => Self::STOP | Self::PAUSE | Self::SEEK_TO,
            Status::Paused => Self::PLAY | Self::STOP,
            Status::Idle | Status::Preparing => {
                Self::PLAY | Self::PLAY_PAUSE | Self::STOP | Self::PAUSE
            }
        };
        always | by_state
    }
}

impl BitOr for Actions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Actions({})", names.join(" | "))
    }
}

/// Immutable snapshot published after every engine transition.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub status: Status,
    /// Position at `updated_at`, in milliseconds.
    pub position_ms: u64,
    pub rate: f32,
    pub volume: f32,
    pub updated_at: Instant,
    pub actions: Actions,
    /// Track the engine has prepared, if any.
    pub track: Option<Arc<TrackMetadata>>,
    /// Set when a resource failure ended the last playback attempt.
    pub error: Option<String>,
}

impl PlaybackState {
    pub fn new(status: Status, position_ms: u64) -> Self {
        Self {
            status,
            position_ms,
            rate: 1.0,
            volume: 1.0,
            updated_at: Instant::now(),
            actions: Actions::for_status(status),
            track: None,
            error: None,
        }
    }

    /// Best estimate of the position at `now`; only advances while playing.
    pub fn position_at(&self, now: Instant) -> u64 {
        if self.status != Status::Playing {
            return self.position_ms;
        }
        let elapsed = now.saturating_duration_since(self.updated_at);
        let advanced = elapsed.mul_f32(self.rate.max(0.0));
        let mut position = self.position_ms + advanced.as_millis() as u64;
        if let Some(track) = self.track.as_ref().filter(|t| t.duration_ms > 0) {
            position = position.min(track.duration_ms);
        }
        position
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(Status::Idle, 0)
    }
}
