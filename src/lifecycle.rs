//! Foreground lifecycle derived from the playback state stream.
//!
//! Playing starts the service (or refreshes it on a track change), pausing
//! keeps it up with a refreshed notification, and stopping lets it go.

use std::sync::Mutex;

use tracing::debug;

use crate::error::ObserverError;
use crate::playback::{PlaybackObserver, PlaybackState, Status};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleTransition {
    StartForeground,
    RefreshNotification,
    LeaveForeground,
}

pub type TransitionHook = Box<dyn Fn(LifecycleTransition, &PlaybackState) + Send + Sync>;

pub struct ServiceLifecycle {
    started: Mutex<bool>,
    hook: TransitionHook,
}

impl ServiceLifecycle {
    pub fn new(hook: impl Fn(LifecycleTransition, &PlaybackState) + Send + Sync + 'static) -> Self {
        Self {
            started: Mutex::new(false),
            hook: Box::new(hook),
        }
    }

    #[cfg(test)]
    pub fn is_started(&self) -> bool {
        self.started.lock().map(|s| *s).unwrap_or(false)
    }

    fn transition(&self, status: Status, started: &mut bool) -> Option<LifecycleTransition> {
        match status {
            Status::Playing if !*started => {
                *started = true;
                Some(LifecycleTransition::StartForeground)
            }
            Status::Playing | Status::Paused if *started => {
                Some(LifecycleTransition::RefreshNotification)
            }
            // Told even when nothing ever started, so a stop from idle can end the process.
            Status::Stopped => {
                *started = false;
                Some(LifecycleTransition::LeaveForeground)
            }
            _ => None,
        }
    }
}

impl PlaybackObserver for ServiceLifecycle {
    fn on_state(&self, state: &PlaybackState) -> Result<(), ObserverError> {
        let transition = {
            let mut started = self
                .started
                .lock()
                .map_err(|_| ObserverError::Failed("lifecycle lock poisoned".to_string()))?;
            self.transition(state.status, &mut started)
        };

        if let Some(t) = transition {
            debug!(transition = ?t, status = ?state.status, "lifecycle");
            (self.hook)(t, state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
