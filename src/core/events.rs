//! Target notifications
//!
//! Listeners are shared `Arc`s so the worker can take a copy of the list and
//! call them without holding the registry lock. A listener may therefore
//! register further listeners; those take effect from the next target on.

use std::sync::Arc;
use std::time::Instant;

use crate::detection::Target;

/// Emitted each time the pointer is moved to a target
#[derive(Debug, Clone)]
pub struct TargetEvent {
    pub target: Target,
    /// Running-loop iteration the target was found in (1-based)
    pub iteration: u64,
    /// When the move completed
    pub timestamp: Instant,
}

impl TargetEvent {
    pub fn new(target: Target, iteration: u64) -> Self {
        Self {
            target,
            iteration,
            timestamp: Instant::now(),
        }
    }

    pub fn center(&self) -> (i32, i32) {
        self.target.center
    }
}

/// Boxed listener as handed in by callers
pub type TargetCallback = Box<dyn Fn(&TargetEvent) + Send + Sync>;

/// Shared listener as stored in the registry
pub type Listener = Arc<dyn Fn(&TargetEvent) + Send + Sync>;

/// Registry of target listeners
#[derive(Default)]
pub struct EventHandler {
    listeners: Vec<Listener>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_target(&mut self, callback: TargetCallback) {
        self.listeners.push(Arc::from(callback));
    }

    /// Copy of the current listener list
    pub fn listeners(&self) -> Vec<Listener> {
        self.listeners.clone()
    }

    /// Call every listener with `event`, in registration order
    pub fn emit(&self, event: &TargetEvent) {
        self.listeners.iter().for_each(|listener| listener(event));
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn event() -> TargetEvent {
        let target = Target::new(Detection::new(0, 0.9, [10.0, 0.0, 30.0, 10.0]));
        TargetEvent::new(target, 1)
    }

    #[test]
    fn test_emit_reaches_every_listener() {
        let sum = Arc::new(AtomicI32::new(0));
        let mut handler = EventHandler::new();
        assert!(!handler.has_listeners());

        for _ in 0..2 {
            let s = sum.clone();
            handler.on_target(Box::new(move |event| {
                s.fetch_add(event.center().0, Ordering::SeqCst);
            }));
        }
        assert!(handler.has_listeners());

        handler.emit(&event());
        assert_eq!(sum.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn test_listener_can_register_during_dispatch() {
        let handler = Arc::new(Mutex::new(EventHandler::new()));
        let calls = Arc::new(AtomicI32::new(0));
        {
            let registry = handler.clone();
            let calls = calls.clone();
            handler.lock().on_target(Box::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                let calls = calls.clone();
                registry.lock().on_target(Box::new(move |_| {
                    calls.fetch_add(100, Ordering::SeqCst);
                }));
            }));
        }

        // Dispatch the way the tracking loop does: copy, unlock, call
        let listeners = handler.lock().listeners();
        let e = event();
        listeners.iter().for_each(|listener| listener(&e));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.lock().listeners().len(), 2);
    }
}
