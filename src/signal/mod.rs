//! Cancellation
//!
//! A session is stopped through a one-shot `CancellationToken`. External
//! listeners (a hotkey poller, stdin, a UI button) implement
//! `CancellationSignal` and fire a callback at most once; the supervisor wires
//! that callback to the token.

mod keys;
#[cfg(target_os = "windows")]
mod keyboard;
mod stdin;

pub use keys::ExitKey;
#[cfg(target_os = "windows")]
pub use keyboard::KeyboardListener;
pub use stdin::StdinListener;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::Result;

/// Monotonic stop flag shared between the listener, the worker and the caller.
///
/// Once cancelled it stays cancelled; there is no way to clear it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns true if this call was the one that set the flag.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Callback fired when an external stop is requested
pub type TriggerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Source of an asynchronous "stop requested" notification
pub trait CancellationSignal: Send {
    /// Register the callback. Implementations invoke it at most once.
    fn on_trigger(&mut self, callback: TriggerCallback) -> Result<()>;

    /// Stop listening. Called once the session has ended.
    fn shutdown(&mut self) {}
}

/// Signal fired programmatically through a `ManualTrigger` handle
#[derive(Default)]
pub struct ManualSignal {
    slot: Arc<Mutex<Option<TriggerCallback>>>,
}

impl ManualSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that fires this signal from any thread
    pub fn trigger(&self) -> ManualTrigger {
        ManualTrigger {
            slot: self.slot.clone(),
        }
    }
}

impl CancellationSignal for ManualSignal {
    fn on_trigger(&mut self, callback: TriggerCallback) -> Result<()> {
        *self.slot.lock() = Some(callback);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.slot.lock().take();
    }
}

/// Cloneable handle for a `ManualSignal`
#[derive(Clone)]
pub struct ManualTrigger {
    slot: Arc<Mutex<Option<TriggerCallback>>>,
}

impl ManualTrigger {
    /// Fire the registered callback. Returns false if nothing was registered,
    /// it already fired, or the signal was shut down.
    pub fn fire(&self) -> bool {
        let callback = self.slot.lock().take();
        match callback {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }
}
