//! Mock collaborators for testing
//!
//! Scripted stand-ins for the frame source, model and actuator so tracking
//! sessions can be driven deterministically without a screen, a model or a
//! pointer device.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::actuator::Actuator;
use crate::capture::{Frame, FrameSource};
use crate::detection::{ClassMap, Detection};
use crate::inference::{Detector, ModelLoader};
use crate::signal::CancellationToken;
use crate::{Result, TrackerError};

// =============================================================================
// Frame source
// =============================================================================

/// Frame source producing blank frames, with scripted failures.
///
/// Capture calls are numbered from 1.
pub struct MockFrameSource {
    width: u32,
    height: u32,
    fail_on: HashSet<u64>,
    panic_on: HashSet<u64>,
    cancel_after: Option<(u64, CancellationToken)>,
    delay: Duration,
    captures: Arc<AtomicU64>,
}

impl MockFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
            cancel_after: None,
            delay: Duration::ZERO,
            captures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return a capture error on the given call
    pub fn fail_on(mut self, call: u64) -> Self {
        self.fail_on.insert(call);
        self
    }

    /// Panic on the given call
    pub fn panic_on(mut self, call: u64) -> Self {
        self.panic_on.insert(call);
        self
    }

    /// Cancel `token` during the given call; the frame is still returned
    pub fn cancel_after(mut self, call: u64, token: CancellationToken) -> Self {
        self.cancel_after = Some((call, token));
        self
    }

    /// Block for `delay` on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared counter of capture calls
    pub fn capture_count(&self) -> Arc<AtomicU64> {
        self.captures.clone()
    }
}

impl FrameSource for MockFrameSource {
    fn capture(&mut self) -> Result<Frame> {
        let call = self.captures.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some((after, token)) = &self.cancel_after {
            if call >= *after {
                token.cancel();
            }
        }
        if self.panic_on.contains(&call) {
            panic!("mock capture panic on call {}", call);
        }
        if self.fail_on.contains(&call) {
            return Err(TrackerError::Capture(format!("mock capture failure on call {}", call)));
        }
        Ok(Frame::blank(self.width, self.height))
    }
}

// =============================================================================
// Model
// =============================================================================

/// Loader handing out a `MockDetector`
pub struct MockModelLoader {
    classes: ClassMap,
    script: Vec<Vec<Detection>>,
    fail_inference_on: HashSet<u64>,
    load_error: Mutex<Option<TrackerError>>,
    frames_seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl MockModelLoader {
    pub fn new(classes: ClassMap) -> Self {
        Self {
            classes,
            script: Vec::new(),
            fail_inference_on: HashSet::new(),
            load_error: Mutex::new(None),
            frames_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return the same detections on every inference call
    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.script = vec![detections];
        self
    }

    /// Return one entry per inference call, cycling. The warm-up call
    /// consumes an entry like any other.
    pub fn with_script(mut self, script: Vec<Vec<Detection>>) -> Self {
        self.script = script;
        self
    }

    /// Fail the given inference call (numbered from 1, warm-up included)
    pub fn fail_inference_on(mut self, call: u64) -> Self {
        self.fail_inference_on.insert(call);
        self
    }

    /// Make `load` fail with `error`
    pub fn fail_with(self, error: TrackerError) -> Self {
        *self.load_error.lock() = Some(error);
        self
    }

    /// Dimensions of every frame passed to inference, in call order
    pub fn frames_seen(&self) -> Arc<Mutex<Vec<(u32, u32)>>> {
        self.frames_seen.clone()
    }
}

impl ModelLoader for MockModelLoader {
    fn load(&self, _reference: &str) -> Result<Box<dyn Detector>> {
        if let Some(error) = self.load_error.lock().take() {
            return Err(error);
        }
        Ok(Box::new(MockDetector {
            classes: self.classes.clone(),
            script: self.script.clone(),
            fail_on: self.fail_inference_on.clone(),
            calls: 0,
            frames_seen: self.frames_seen.clone(),
        }))
    }
}

/// Detector replaying a script of detection lists
pub struct MockDetector {
    classes: ClassMap,
    script: Vec<Vec<Detection>>,
    fail_on: HashSet<u64>,
    calls: u64,
    frames_seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl Detector for MockDetector {
    fn infer(&mut self, frame: &Frame, _confidence_threshold: f32) -> Result<Vec<Detection>> {
        self.calls += 1;
        self.frames_seen.lock().push((frame.width, frame.height));

        if self.fail_on.contains(&self.calls) {
            return Err(TrackerError::Inference(format!(
                "mock inference failure on call {}",
                self.calls
            )));
        }
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let index = ((self.calls - 1) % self.script.len() as u64) as usize;
        Ok(self.script[index].clone())
    }

    fn class_names(&self) -> &ClassMap {
        &self.classes
    }
}

// =============================================================================
// Actuator
// =============================================================================

/// Actuator recording every successful move
pub struct RecordingActuator {
    moves: Arc<Mutex<Vec<(i32, i32)>>>,
    fail_on: HashSet<u64>,
    calls: u64,
    delay: Duration,
    dropped: Arc<AtomicBool>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self {
            moves: Arc::new(Mutex::new(Vec::new())),
            fail_on: HashSet::new(),
            calls: 0,
            delay: Duration::ZERO,
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail the given move call (numbered from 1)
    pub fn fail_on(mut self, call: u64) -> Self {
        self.fail_on.insert(call);
        self
    }

    /// Block for `delay` on every move, on top of the requested duration
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Successful moves, in order
    pub fn moves(&self) -> Arc<Mutex<Vec<(i32, i32)>>> {
        self.moves.clone()
    }

    /// Set once the actuator has been dropped
    pub fn dropped_flag(&self) -> Arc<AtomicBool> {
        self.dropped.clone()
    }
}

impl Default for RecordingActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for RecordingActuator {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<()> {
        self.calls += 1;
        thread::sleep(duration + self.delay);
        if self.fail_on.contains(&self.calls) {
            return Err(TrackerError::Actuation(format!("mock move failure on call {}", self.calls)));
        }
        self.moves.lock().push((x, y));
        Ok(())
    }
}

impl Drop for RecordingActuator {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}
