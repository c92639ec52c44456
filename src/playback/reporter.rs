//! Fan-out of `PlaybackState` snapshots to observers.
//!
//! Delivery is synchronous and in registration order. An observer that
//! returns an error is dropped and the remaining observers still get the
//! snapshot.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::error::ObserverError;

use super::state::PlaybackState;

pub trait PlaybackObserver: Send + Sync {
    fn on_state(&self, state: &PlaybackState) -> Result<(), ObserverError>;
}

impl<F> PlaybackObserver for F
where
    F: Fn(&PlaybackState) -> Result<(), ObserverError> + Send + Sync,
{
    fn on_state(&self, state: &PlaybackState) -> Result<(), ObserverError> {
        self(state)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    observer: Arc<dyn PlaybackObserver>,
}

#[derive(Default)]
struct ReporterState {
    observers: Vec<Registration>,
    next_id: u64,
    latest: Option<PlaybackState>,
}

/// Cloneable handle; every clone talks to the same observer list.
#[derive(Clone, Default)]
pub struct PlaybackStateReporter {
    inner: Arc<Mutex<ReporterState>>,
}

impl PlaybackStateReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `observer`. Registering the same `Arc` twice returns the existing id.
    pub fn subscribe(&self, observer: Arc<dyn PlaybackObserver>) -> SubscriptionId {
        let mut state = self.lock();
        if let Some(existing) = state
            .observers
            .iter()
            .find(|r| Arc::ptr_eq(&r.observer, &observer))
        {
            return existing.id;
        }
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.observers.push(Registration { id, observer });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.observers.len();
        state.observers.retain(|r| r.id != id);
        state.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Last published snapshot.
    pub fn latest(&self) -> Option<PlaybackState> {
        self.lock().latest.clone()
    }

    pub fn publish(&self, snapshot: PlaybackState) {
        // Dispatch over a copy so observers can (un)subscribe while being notified.
        let observers = {
            let mut state = self.lock();
            state.latest = Some(snapshot.clone());
            state.observers.clone()
        };

        let mut failed: Vec<SubscriptionId> = Vec::new();
        for registration in &observers {
            if let Err(e) = registration.observer.on_state(&snapshot) {
                warn!(subscription = ?registration.id, error = %e, "dropping failed playback observer");
                failed.push(registration.id);
            }
        }

        if !failed.is_empty() {
            self.lock().observers.retain(|r| !failed.contains(&r.id));
        }
    }
}
