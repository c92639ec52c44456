//! Playback subsystem: the engine state machine and everything around it.
//!
//! The engine runs on its own thread and is driven through `Player`.
//! Focus changes, route changes and decoder completion reach it as
//! messages on the same channel as user commands.

mod broker;
mod decoder;
mod engine;
mod focus;
mod noisy;
mod player;
mod queue;
mod reporter;
mod sink;
mod state;
mod thread;
mod types;

pub use broker::{BrokerClient, FocusBroker, FocusKind};
pub use decoder::{AudioBackend, Decoder};
pub use engine::PlaybackEngine;
pub use focus::{
    AudioFocusArbiter, FocusAction, FocusChange, FocusGrant, FocusProvider, FocusState,
};
pub use noisy::{DefaultDeviceWatcher, NoisyNotifier, NoisyOutputMonitor, NullRoute, OutputRoute};
pub use player::{EventSender, Player, Wiring};
pub use queue::{QueueItem, QueueManager};
pub use reporter::{PlaybackObserver, PlaybackStateReporter, SubscriptionId};
pub use sink::{RodioBackend, RodioDecoder};
pub use state::{Actions, PlaybackState, Status};
pub use types::{EngineCmd, PauseCause, PlayOutcome};

#[cfg(test)]
mod tests;
