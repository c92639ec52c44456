//! In-process focus broker shared by several focus clients.
//!
//! Holders form a stack. A full `Gain` request takes focus away from every
//! other holder for good; transient requests only interrupt the current top,
//! which gets `Gain` back once the transient holder abandons.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::focus::{FocusChange, FocusGrant, FocusProvider};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FocusKind {
    Gain,
    Transient,
    TransientMayDuck,
}

pub type FocusListener = Arc<dyn Fn(FocusChange) + Send + Sync>;

#[derive(Default)]
struct BrokerState {
    next_id: u64,
    listeners: HashMap<u64, FocusListener>,
    /// Focus holders, last entry on top.
    stack: Vec<u64>,
}

#[derive(Clone, Default)]
pub struct FocusBroker {
    inner: Arc<Mutex<BrokerState>>,
}

impl FocusBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a client whose focus changes are delivered to `listener`.
    pub fn client(
        &self,
        kind: FocusKind,
        listener: impl Fn(FocusChange) + Send + Sync + 'static,
    ) -> BrokerClient {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, Arc::new(listener));
        BrokerClient {
            id,
            kind,
            broker: self.clone(),
        }
    }

    /// Id of the client currently on top, if any.
    pub fn holder(&self) -> Option<u64> {
        self.lock().stack.last().copied()
    }

    fn request(&self, id: u64, kind: FocusKind) -> FocusGrant {
        let notifications = {
            let mut state = self.lock();
            if state.stack.last() == Some(&id) {
                return FocusGrant::Granted;
            }
            state.stack.retain(|&h| h != id);

            let losers: Vec<(u64, FocusChange)> = match kind {
                FocusKind::Gain => state
                    .stack
                    .drain(..)
                    .map(|h| (h, FocusChange::Loss))
                    .collect(),
                FocusKind::Transient => state
                    .stack
                    .last()
                    .map(|&h| (h, FocusChange::LossTransient))
                    .into_iter()
                    .collect(),
                FocusKind::TransientMayDuck => state
                    .stack
                    .last()
                    .map(|&h| (h, FocusChange::LossTransientCanDuck))
                    .into_iter()
                    .collect(),
            };
            state.stack.push(id);
            debug!(client = id, ?kind, holders = state.stack.len(), "focus granted");
            Self::collect_listeners(&state, losers)
        };

        // Listeners run outside the lock so they may call back into the broker.
        for (listener, change) in notifications {
            listener(change);
        }
        FocusGrant::Granted
    }

    fn abandon(&self, id: u64) {
        let notifications = {
            let mut state = self.lock();
            let was_top = state.stack.last() == Some(&id);
            state.stack.retain(|&h| h != id);
            let regained = if was_top {
                state.stack.last().map(|&h| (h, FocusChange::Gain))
            } else {
                None
            };
            Self::collect_listeners(&state, regained.into_iter().collect())
        };

        for (listener, change) in notifications {
            listener(change);
        }
    }

    fn forget(&self, id: u64) {
        self.lock().listeners.remove(&id);
    }

    fn collect_listeners(
        state: &BrokerState,
        changes: Vec<(u64, FocusChange)>,
    ) -> Vec<(FocusListener, FocusChange)> {
        changes
            .into_iter()
            .filter_map(|(h, change)| state.listeners.get(&h).map(|l| (l.clone(), change)))
            .collect()
    }
}

/// A `FocusProvider` backed by a shared [`FocusBroker`].
pub struct BrokerClient {
    id: u64,
    kind: FocusKind,
    broker: FocusBroker,
}

impl BrokerClient {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl FocusProvider for BrokerClient {
    fn request(&mut self) -> FocusGrant {
        self.broker.request(self.id, self.kind)
    }

    fn abandon(&mut self) {
        self.broker.abandon(self.id);
    }
}

impl Drop for BrokerClient {
    fn drop(&mut self) {
        self.broker.abandon(self.id);
        self.broker.forget(self.id);
    }
}
