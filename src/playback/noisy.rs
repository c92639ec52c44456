//! Output-route monitoring: pause when the output becomes "noisy".
//!
//! A route watcher raises a signal when the active output goes away (for
//! example headphones being unplugged and the device falling back to the
//! speakers). The engine only listens while output is active.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rodio::cpal::traits::{DeviceTrait, HostTrait};
use tracing::{debug, info};

pub type NoisyNotifier = Arc<dyn Fn() + Send + Sync>;

/// Source of route-disconnect signals.
pub trait OutputRoute: Send {
    /// Start delivering signals.
    fn watch(&mut self);

    /// Stop delivering signals.
    fn unwatch(&mut self);
}

/// Route that never reports anything.
#[derive(Debug, Default)]
pub struct NullRoute;

impl OutputRoute for NullRoute {
    fn watch(&mut self) {}

    fn unwatch(&mut self) {}
}

/// Tracks whether the engine is registered with its route.
pub struct NoisyOutputMonitor {
    route: Box<dyn OutputRoute>,
    registered: bool,
}

impl NoisyOutputMonitor {
    pub fn new(route: Box<dyn OutputRoute>) -> Self {
        Self {
            route,
            registered: false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn register(&mut self) {
        if !self.registered {
            self.route.watch();
            self.registered = true;
        }
    }

    pub fn unregister(&mut self) {
        if self.registered {
            self.route.unwatch();
            self.registered = false;
        }
    }
}

impl Drop for NoisyOutputMonitor {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Watches the name of the default output device and signals when it changes.
pub struct DefaultDeviceWatcher {
    poll: Duration,
    notify: NoisyNotifier,
    active: Option<Arc<AtomicBool>>,
}

impl DefaultDeviceWatcher {
    pub fn new(poll: Duration, notify: NoisyNotifier) -> Self {
        Self {
            poll,
            notify,
            active: None,
        }
    }
}

fn default_device_name() -> Option<String> {
    rodio::cpal::default_host()
        .default_output_device()
        .and_then(|d| d.name().ok())
}

impl OutputRoute for DefaultDeviceWatcher {
    fn watch(&mut self) {
        if self.active.is_some() {
            return;
        }
        let active = Arc::new(AtomicBool::new(true));
        self.active = Some(active.clone());

        let poll = self.poll;
        let notify = self.notify.clone();
        thread::spawn(move || {
            let initial = default_device_name();
            debug!(device = ?initial, "watching default output device");
            while active.load(Ordering::Relaxed) {
                thread::sleep(poll);
                if !active.load(Ordering::Relaxed) {
                    break;
                }
                let current = default_device_name();
                if current != initial {
                    info!(from = ?initial, to = ?current, "default output device changed");
                    notify();
                    break;
                }
            }
        });
    }

    fn unwatch(&mut self) {
        if let Some(active) = self.active.take() {
            active.store(false, Ordering::Relaxed);
        }
    }
}

impl Drop for DefaultDeviceWatcher {
    fn drop(&mut self) {
        self.unwatch();
    }
}
