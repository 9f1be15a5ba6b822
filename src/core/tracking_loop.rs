//! The tracking loop state machine
//!
//! ```text
//! Initializing -> Warming -> Running -> Stopping -> Stopped
//!       |                      ^   |
//!       | fatal error          +---+ one iteration per pass
//!       v
//!   (session aborted)
//! ```
//!
//! Cancellation is cooperative: the stop flag is checked at the top of every
//! running iteration and no capture, inference or move is interrupted. The
//! worst-case stop latency is therefore one full iteration (capture, inference,
//! move) plus the poll interval, or the error backoff if that iteration failed.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use super::events::{EventHandler, TargetEvent};
use super::performance::PerformanceTracker;
use super::state::{RunState, SessionPhase};
use crate::actuator::Actuator;
use crate::capture::{Frame, FrameSource};
use crate::config::TrackingConfig;
use crate::detection::{resolve_class_id, select_target};
use crate::inference::{Detector, ModelLoader};
use crate::signal::CancellationToken;
use crate::{Result, TrackerError};

/// External collaborators driven by the loop
pub struct Backends {
    pub loader: Box<dyn ModelLoader>,
    pub source: Box<dyn FrameSource>,
    pub actuator: Box<dyn Actuator>,
}

impl Backends {
    pub fn new(
        loader: impl ModelLoader + 'static,
        source: impl FrameSource + 'static,
        actuator: impl Actuator + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            source: Box::new(source),
            actuator: Box::new(actuator),
        }
    }
}

/// How one running iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Stop flag was set; nothing was captured
    Cancelled,
    /// Frame processed, no qualifying detection
    NoTarget,
    /// Frame processed and the pointer moved to a target
    Actuated,
    /// The iteration failed and the loop backed off
    Recovered,
}

/// Loaded model plus the resolved target class
struct Session {
    detector: Box<dyn Detector>,
    class_id: u32,
}

enum LoopState {
    Initializing,
    Warming(Session),
    Running(Session),
    Stopping,
    Stopped,
}

impl LoopState {
    fn phase(&self) -> SessionPhase {
        match self {
            LoopState::Initializing => SessionPhase::Initializing,
            LoopState::Warming(_) => SessionPhase::Warming,
            LoopState::Running(_) => SessionPhase::Running,
            LoopState::Stopping => SessionPhase::Stopping,
            LoopState::Stopped => SessionPhase::Stopped,
        }
    }
}

/// Worker-side tracking loop. Owns every collaborator and all counters.
pub struct TrackingLoop {
    config: TrackingConfig,
    backends: Backends,
    cancel: CancellationToken,
    perf: PerformanceTracker,
    iterations: u64,
    last_target: Option<(i32, i32)>,
    published: Option<Arc<RwLock<RunState>>>,
    events: Option<Arc<Mutex<EventHandler>>>,
}

impl TrackingLoop {
    pub fn new(config: TrackingConfig, backends: Backends, cancel: CancellationToken) -> Self {
        Self {
            config,
            backends,
            cancel,
            perf: PerformanceTracker::new(),
            iterations: 0,
            last_target: None,
            published: None,
            events: None,
        }
    }

    /// Publish a snapshot into `state` after every transition and iteration
    pub fn publish_to(mut self, state: Arc<RwLock<RunState>>) -> Self {
        self.published = Some(state);
        self
    }

    /// Emit a `TargetEvent` through `events` for every actuated target
    pub fn emit_to(mut self, events: Arc<Mutex<EventHandler>>) -> Self {
        self.events = Some(events);
        self
    }

    /// Drive the session to `Stopped`.
    ///
    /// Returns the final run state, or the fatal initialization error.
    pub fn run(mut self) -> Result<RunState> {
        let mut state = LoopState::Initializing;

        loop {
            let phase = state.phase();
            state = match state {
                LoopState::Initializing => {
                    self.publish(phase);
                    match self.initialize() {
                        Ok(session) => LoopState::Warming(session),
                        Err(e) => {
                            log::error!("Tracking session aborted: {}", e);
                            self.publish_failure(&e);
                            return Err(e);
                        }
                    }
                }
                LoopState::Warming(mut session) => {
                    self.publish(phase);
                    if self.cancel.is_cancelled() {
                        LoopState::Stopping
                    } else {
                        self.warm_up(&mut session);
                        self.perf = PerformanceTracker::new();
                        self.publish(SessionPhase::Running);
                        log::info!("Tracking started");
                        LoopState::Running(session)
                    }
                }
                LoopState::Running(mut session) => match self.iterate(&mut session) {
                    IterationOutcome::Cancelled => LoopState::Stopping,
                    _ => {
                        self.publish(phase);
                        LoopState::Running(session)
                    }
                },
                LoopState::Stopping => {
                    self.publish(phase);
                    log::info!("Stop requested, tracking loop shutting down");
                    LoopState::Stopped
                }
                LoopState::Stopped => break,
            };
        }

        let final_state = self.snapshot(SessionPhase::Stopped);
        self.publish(SessionPhase::Stopped);
        log::info!(
            "Tracking stopped: {} frames, {} detections, {} errors",
            final_state.frames_total,
            final_state.detections_total,
            final_state.errors_total
        );
        Ok(final_state)
    }

    fn initialize(&mut self) -> Result<Session> {
        let reference = self.config.model.clone();
        log::info!("Loading model: {}", reference);

        let detector = self.backends.loader.load(&reference).map_err(|e| match e {
            e @ TrackerError::ModelLoadFailed { .. } => e,
            other => TrackerError::model_load(&reference, other),
        })?;

        let classes = detector.class_names();
        log::info!("Model loaded, {} classes:", classes.len());
        for (id, name) in classes {
            log::info!("  {}: {}", id, name);
        }

        let class_id = resolve_class_id(&self.config.target_class, classes)?;
        log::info!(
            "Tracking class {} ('{}'), confidence threshold {}",
            class_id,
            classes.get(&class_id).map(String::as_str).unwrap_or_default(),
            self.config.confidence_threshold
        );

        Ok(Session { detector, class_id })
    }

    /// One throwaway inference so the first real frame has representative latency
    fn warm_up(&mut self, session: &mut Session) {
        let size = self.config.warmup_size;
        log::debug!("Warming up model on a {}x{} blank frame", size, size);
        let frame = Frame::blank(size, size);
        if let Err(e) = session.detector.infer(&frame, self.config.confidence_threshold) {
            log::warn!("Warm-up inference failed: {}", e);
        }
    }

    fn iterate(&mut self, session: &mut Session) -> IterationOutcome {
        if self.cancel.is_cancelled() {
            return IterationOutcome::Cancelled;
        }
        self.iterations += 1;

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process_frame(session)));
        let error = match result {
            Ok(Ok(outcome)) => {
                thread::sleep(self.config.poll_interval());
                return outcome;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panic: {}", panic_message(payload.as_ref())),
        };

        log::warn!("Error during iteration {}: {}", self.iterations, error);
        self.perf.record_error();
        thread::sleep(self.config.error_backoff());
        IterationOutcome::Recovered
    }

    fn process_frame(&mut self, session: &mut Session) -> Result<IterationOutcome> {
        let threshold = self.config.confidence_threshold;

        let frame = self.backends.source.capture()?;
        let detections = session.detector.infer(&frame, threshold)?;

        let outcome = match select_target(&detections, session.class_id, threshold) {
            Some(target) => {
                let (cx, cy) = target.center;
                self.backends.actuator.move_to(cx, cy, self.config.move_duration())?;
                self.perf.record_detection();
                self.last_target = Some(target.center);
                log::debug!(
                    "Target at ({}, {}), confidence {:.2}",
                    cx,
                    cy,
                    target.detection.confidence
                );
                if let Some(events) = &self.events {
                    // Registry lock is released before any listener runs
                    let listeners = events.lock().listeners();
                    let event = TargetEvent::new(target, self.iterations);
                    listeners.iter().for_each(|listener| listener(&event));
                }
                IterationOutcome::Actuated
            }
            None => IterationOutcome::NoTarget,
        };

        self.perf.record_frame();
        if let Some(fps) = self.perf.update(Instant::now()) {
            log::info!(
                "FPS: {:.1}, detections: {}",
                fps,
                self.perf.detections_total()
            );
        }

        Ok(outcome)
    }

    fn snapshot(&self, phase: SessionPhase) -> RunState {
        let mut state = RunState {
            stop_requested: self.cancel.is_cancelled(),
            phase,
            last_target: self.last_target,
            ..RunState::default()
        };
        self.perf.fill(&mut state);
        state
    }

    fn publish(&self, phase: SessionPhase) {
        if let Some(shared) = &self.published {
            *shared.write() = self.snapshot(phase);
        }
    }

    fn publish_failure(&self, error: &TrackerError) {
        if let Some(shared) = &self.published {
            let mut state = self.snapshot(SessionPhase::Stopped);
            state.fatal_error = Some(error.to_string());
            *shared.write() = state;
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{ClassMap, Detection};
    use crate::mock::{MockFrameSource, MockModelLoader, RecordingActuator};
    use std::time::Duration;

    fn fast_config(target: &str) -> TrackingConfig {
        TrackingConfig::new(target, "mock-model")
            .with_poll_interval(Duration::ZERO)
            .with_error_backoff(Duration::ZERO)
            .with_confidence(0.5)
            .with_warmup_size(8)
    }

    fn classes() -> ClassMap {
        [(0, "person"), (1, "truck")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect()
    }

    #[test]
    fn test_cancelled_before_start_never_captures() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let source = MockFrameSource::new(4, 4);
        let captures = source.capture_count();
        let backends = Backends::new(
            MockModelLoader::new(classes()),
            source,
            RecordingActuator::new(),
        );

        let state = TrackingLoop::new(fast_config("truck"), backends, cancel)
            .run()
            .unwrap();

        assert!(state.stop_requested);
        assert_eq!(state.phase, SessionPhase::Stopped);
        assert_eq!(captures.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_class_is_fatal() {
        let backends = Backends::new(
            MockModelLoader::new(classes()),
            MockFrameSource::new(4, 4),
            RecordingActuator::new(),
        );
        let published = Arc::new(RwLock::new(RunState::starting()));

        let err = TrackingLoop::new(fast_config("Tank"), backends, CancellationToken::new())
            .publish_to(published.clone())
            .run()
            .unwrap_err();

        assert!(matches!(err, TrackerError::TargetClassNotFound { .. }));
        let state = published.read().clone();
        assert_eq!(state.phase, SessionPhase::Stopped);
        assert!(state.fatal_error.unwrap().contains("Tank"));
    }

    #[test]
    fn test_loader_errors_become_model_load_failures() {
        let backends = Backends::new(
            MockModelLoader::new(classes()).fail_with(TrackerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "weights missing",
            ))),
            MockFrameSource::new(4, 4),
            RecordingActuator::new(),
        );

        let err = TrackingLoop::new(fast_config("truck"), backends, CancellationToken::new())
            .run()
            .unwrap_err();

        match err {
            TrackerError::ModelLoadFailed { reference, reason } => {
                assert_eq!(reference, "mock-model");
                assert!(reason.contains("weights missing"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_panicking_iteration_is_recovered() {
        let cancel = CancellationToken::new();
        let source = MockFrameSource::new(4, 4)
            .panic_on(2)
            .cancel_after(4, cancel.clone());
        let loader = MockModelLoader::new(classes())
            .with_detections(vec![Detection::new(1, 0.9, [0.0, 0.0, 10.0, 10.0])]);
        let actuator = RecordingActuator::new();
        let moves = actuator.moves();

        let state = TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, actuator),
            cancel,
        )
        .run()
        .unwrap();

        assert_eq!(state.errors_total, 1);
        assert_eq!(state.frames_total, 3);
        assert_eq!(state.detections_total, 3);
        assert_eq!(moves.lock().len(), 3);
        assert_eq!(state.last_target, Some((5, 5)));
    }

    #[test]
    fn test_actuation_failure_not_counted_as_detection() {
        let cancel = CancellationToken::new();
        let source = MockFrameSource::new(4, 4).cancel_after(3, cancel.clone());
        let loader = MockModelLoader::new(classes())
            .with_detections(vec![Detection::new(1, 0.9, [0.0, 0.0, 10.0, 10.0])]);
        let actuator = RecordingActuator::new().fail_on(1);

        let state = TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, actuator),
            cancel,
        )
        .run()
        .unwrap();

        assert_eq!(state.errors_total, 1);
        assert_eq!(state.detections_total, 2);
        assert_eq!(state.frames_total, 2);
    }

    #[test]
    fn test_inference_failure_is_contained() {
        let cancel = CancellationToken::new();
        let source = MockFrameSource::new(4, 4).cancel_after(5, cancel.clone());
        let captures = source.capture_count();
        // Call 1 is the warm-up, so call 3 is the second running iteration
        let loader = MockModelLoader::new(classes())
            .with_detections(vec![Detection::new(1, 0.9, [0.0, 0.0, 10.0, 10.0])])
            .fail_inference_on(3);
        let actuator = RecordingActuator::new();
        let moves = actuator.moves();

        let state = TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, actuator),
            cancel,
        )
        .run()
        .unwrap();

        assert_eq!(captures.load(std::sync::atomic::Ordering::SeqCst), 5);
        assert_eq!(state.errors_total, 1);
        assert_eq!(state.frames_total, 4);
        assert_eq!(state.detections_total, 4);
        assert_eq!(moves.lock().len(), 4);
    }

    #[test]
    fn test_warm_up_failure_is_ignored() {
        let cancel = CancellationToken::new();
        let source = MockFrameSource::new(4, 4).cancel_after(3, cancel.clone());
        let loader = MockModelLoader::new(classes())
            .with_detections(vec![Detection::new(1, 0.9, [0.0, 0.0, 10.0, 10.0])])
            .fail_inference_on(1);
        let actuator = RecordingActuator::new();
        let moves = actuator.moves();

        let state = TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, actuator),
            cancel,
        )
        .run()
        .unwrap();

        assert_eq!(state.errors_total, 0);
        assert_eq!(state.frames_total, 3);
        assert_eq!(state.detections_total, 3);
        assert_eq!(*moves.lock(), vec![(5, 5); 3]);
    }

    #[test]
    fn test_warm_up_uses_blank_frame() {
        let cancel = CancellationToken::new();
        let loader = MockModelLoader::new(classes());
        let frames_seen = loader.frames_seen();
        let source = MockFrameSource::new(4, 4).cancel_after(1, cancel.clone());

        TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, RecordingActuator::new()),
            cancel,
        )
        .run()
        .unwrap();

        let seen = frames_seen.lock().clone();
        assert_eq!(seen, vec![(8, 8), (4, 4)]);
    }

    #[test]
    fn test_events_emitted_per_target() {
        let cancel = CancellationToken::new();
        let events = Arc::new(Mutex::new(EventHandler::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        {
            let received = received.clone();
            events.lock().on_target(Box::new(move |event| {
                received.lock().push((event.iteration, event.center()));
            }));
        }

        // First entry is consumed by the warm-up inference
        let loader = MockModelLoader::new(classes()).with_script(vec![
            vec![],
            vec![Detection::new(1, 0.9, [0.0, 0.0, 10.0, 10.0])],
            vec![],
            vec![Detection::new(1, 0.9, [10.0, 10.0, 30.0, 30.0])],
        ]);
        let source = MockFrameSource::new(4, 4).cancel_after(3, cancel.clone());

        TrackingLoop::new(
            fast_config("truck"),
            Backends::new(loader, source, RecordingActuator::new()),
            cancel,
        )
        .emit_to(events)
        .run()
        .unwrap();

        assert_eq!(*received.lock(), vec![(1, (5, 5)), (3, (20, 20))]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
