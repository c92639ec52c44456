//! Audio focus arbitration.
//!
//! `AudioFocusArbiter` is the only owner of the focus state. The engine asks
//! it for focus before starting output and feeds it the asynchronous focus
//! changes it receives; the arbiter answers with the command the engine
//! should run.

use tracing::{debug, info};

/// Focus held by this engine, as far as the arbiter knows.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    NotHeld,
    HeldFull,
    HeldDucked,
    TransientLoss,
}

/// Focus change notification delivered by a provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusChange {
    /// Full focus granted (or given back).
    Gain,
    /// Someone needs the output briefly but we may keep playing quietly.
    LossTransientCanDuck,
    /// Someone needs the output briefly and exclusively.
    LossTransient,
    /// Focus is gone for good.
    Loss,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusGrant {
    Granted,
    Denied,
}

/// Device-side focus service.
///
/// Implementations deliver later focus changes by enqueueing them into the
/// engine (see `EventSender::focus_changed`), never by calling the engine.
pub trait FocusProvider: Send {
    fn request(&mut self) -> FocusGrant;

    fn abandon(&mut self);
}

/// What the engine has to do in response to a focus change.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FocusAction {
    Resume,
    SetVolume(f32),
    Pause,
    Stop,
}

pub struct AudioFocusArbiter {
    provider: Box<dyn FocusProvider>,
    state: FocusState,
    /// Playback was paused by a transient loss and should resume on gain.
    interrupted: bool,
    full_volume: f32,
    duck_volume: f32,
}

impl AudioFocusArbiter {
    pub fn new(provider: Box<dyn FocusProvider>, full_volume: f32, duck_volume: f32) -> Self {
        Self {
            provider,
            state: FocusState::NotHeld,
            interrupted: false,
            full_volume,
            duck_volume,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> FocusState {
        self.state
    }

    #[cfg(test)]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn full_volume(&self) -> f32 {
        self.full_volume
    }

    /// Ask the provider for full focus. A denial leaves the state untouched.
    pub fn request(&mut self) -> bool {
        match self.provider.request() {
            FocusGrant::Granted => {
                self.state = FocusState::HeldFull;
                true
            }
            FocusGrant::Denied => {
                debug!(state = ?self.state, "audio focus denied");
                false
            }
        }
    }

    /// Give focus back. Calling this while not holding focus does nothing.
    pub fn abandon(&mut self) {
        if self.state != FocusState::NotHeld {
            self.provider.abandon();
            self.state = FocusState::NotHeld;
        }
        self.interrupted = false;
    }

    /// Translate a focus change into the command the engine should run.
    pub fn on_focus_change(&mut self, change: FocusChange, playing: bool) -> Option<FocusAction> {
        // A change can still be queued after we abandoned focus.
        if self.state == FocusState::NotHeld {
            debug!(?change, "ignoring focus change while focus is not held");
            return None;
        }

        info!(?change, playing, interrupted = self.interrupted, "audio focus changed");
        match change {
            FocusChange::Gain => {
                self.state = FocusState::HeldFull;
                let action = if self.interrupted && !playing {
                    Some(FocusAction::Resume)
                } else if playing {
                    Some(FocusAction::SetVolume(self.full_volume))
                } else {
                    None
                };
                self.interrupted = false;
                action
            }
            FocusChange::LossTransientCanDuck => {
                self.state = FocusState::HeldDucked;
                Some(FocusAction::SetVolume(self.duck_volume))
            }
            FocusChange::LossTransient => {
                self.state = FocusState::TransientLoss;
                if playing {
                    self.interrupted = true;
                    Some(FocusAction::Pause)
                } else {
                    None
                }
            }
            FocusChange::Loss => {
                self.abandon();
                Some(FocusAction::Stop)
            }
        }
    }
}
