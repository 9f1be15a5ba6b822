//! Session supervisor
//!
//! Runs one `TrackingLoop` on a background worker thread and blocks the
//! caller until that thread has exited. The supervisor never returns while
//! the worker is alive, so the actuator and detector handles are never used
//! after a session is reported as ended.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::events::{EventHandler, TargetCallback};
use super::state::{RunState, SessionPhase};
use super::tracking_loop::{panic_message, Backends, TrackingLoop};
use crate::config::TrackingConfig;
use crate::signal::{CancellationSignal, CancellationToken};
use crate::{Result, TrackerError};

/// How often the caller thread checks on the worker
const JOIN_POLL: Duration = Duration::from_millis(100);

/// Coordinates the exit listener, the worker thread and the caller
pub struct Supervisor {
    /// Token for the current (or next) session
    cancel: Mutex<CancellationToken>,
    /// Latest snapshot published by the worker
    state: Arc<RwLock<RunState>>,
    /// Whether a session is in progress
    running: AtomicBool,
    /// Target listeners, shared with every session
    events: Arc<Mutex<EventHandler>>,
    join_poll: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            cancel: Mutex::new(CancellationToken::new()),
            state: Arc::new(RwLock::new(RunState::default())),
            running: AtomicBool::new(false),
            events: Arc::new(Mutex::new(EventHandler::new())),
            join_poll: JOIN_POLL,
        }
    }

    /// Change how often `run` checks whether the worker has exited
    pub fn with_join_poll(mut self, interval: Duration) -> Self {
        self.join_poll = interval;
        self
    }

    /// Token that stops the current session, or the next one if none is
    /// running. A fresh token is installed when a session ends.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Request a stop. `run` still waits for the worker before returning.
    pub fn stop(&self) {
        if self.cancel.lock().cancel() {
            log::info!("Stop requested by caller");
        }
    }

    /// Copy of the latest published run state
    pub fn snapshot(&self) -> RunState {
        self.state.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register a callback for every actuated target.
    ///
    /// Callbacks run on the worker thread. One registered from inside a
    /// callback is first called for the next target.
    pub fn on_target(&self, callback: TargetCallback) {
        self.events.lock().on_target(callback);
    }

    /// Run one tracking session to completion.
    ///
    /// Blocks until the worker thread has exited, either because `signal`
    /// fired, the caller cancelled, or initialization failed. Returns the
    /// final run state or the fatal error that ended the session.
    pub fn run(
        &self,
        config: TrackingConfig,
        backends: Backends,
        signal: &mut dyn CancellationSignal,
    ) -> Result<RunState> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(TrackerError::AlreadyRunning);
        }
        let _session = SessionGuard { supervisor: self };

        config.validate()?;
        let token = self.cancel_token();

        let listener_token = token.clone();
        signal.on_trigger(Box::new(move || {
            if listener_token.cancel() {
                log::info!("Exit signal received");
            }
        }))?;

        let result = self.supervise(config, backends, token);
        signal.shutdown();
        result
    }

    fn supervise(
        &self,
        config: TrackingConfig,
        backends: Backends,
        token: CancellationToken,
    ) -> Result<RunState> {
        *self.state.write() = RunState::starting();

        let worker = TrackingLoop::new(config, backends, token.clone())
            .publish_to(self.state.clone())
            .emit_to(self.events.clone());

        let spawned = thread::Builder::new()
            .name("tracking-loop".to_string())
            .spawn(move || worker.run());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state.write().phase = SessionPhase::Stopped;
                return Err(e.into());
            }
        };

        let guard = WorkerGuard {
            handle: Some(handle),
            cancel: token.clone(),
        };
        log::debug!("Tracking worker started");

        while !guard.is_finished() {
            if token.is_cancelled() {
                log::info!("Waiting for tracking loop to stop");
                break;
            }
            thread::sleep(self.join_poll);
        }

        let outcome = guard.join();
        if let Err(TrackerError::WorkerPanicked(reason)) = &outcome {
            log::error!("Tracking worker panicked: {}", reason);
            let mut state = self.state.write();
            state.phase = SessionPhase::Stopped;
            state.stop_requested = token.is_cancelled();
            state.fatal_error = Some(reason.clone());
        }
        outcome
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running flag and installs a fresh token when a session ends
struct SessionGuard<'a> {
    supervisor: &'a Supervisor,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        *self.supervisor.cancel.lock() = CancellationToken::new();
        self.supervisor.running.store(false, Ordering::SeqCst);
    }
}

/// Owns the worker handle. Dropping it without `join` cancels and joins,
/// so an unwinding caller still waits for the worker.
struct WorkerGuard {
    handle: Option<JoinHandle<Result<RunState>>>,
    cancel: CancellationToken,
}

impl WorkerGuard {
    fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    fn join(mut self) -> Result<RunState> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|payload| TrackerError::WorkerPanicked(panic_message(payload.as_ref())))?,
            None => Err(TrackerError::WorkerPanicked("worker already joined".to_string())),
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}
