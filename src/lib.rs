//! Target Follow
//!
//! A real-time perception-action loop: capture a frame, run an object
//! detector on it, pick the largest confident detection of one class and
//! move the pointer to its center. Repeats until an exit signal fires.
//!
//! The detector, frame source, pointer actuator and exit listener are all
//! traits, so the loop can run against the screen and cursor on Windows,
//! against recorded frames and detections offline, or against the scripted
//! mocks in [`mock`] in tests.
//!
//! ```no_run
//! use target_follow::{
//!     Backends, BlankFrameSource, LogActuator, ManualSignal, ReplayModelLoader, Supervisor,
//!     TrackingConfig,
//! };
//!
//! let config = TrackingConfig::new("truck", "detections.json");
//! let backends = Backends::new(
//!     ReplayModelLoader::new(),
//!     BlankFrameSource::new(640, 480),
//!     LogActuator::new(),
//! );
//! let supervisor = Supervisor::new();
//! let state = supervisor.run(config, backends, &mut ManualSignal::new())?;
//! println!("{} targets followed", state.detections_total);
//! # Ok::<(), target_follow::TrackerError>(())
//! ```

mod error;

pub mod actuator;
pub mod capture;
pub mod config;
pub mod core;
pub mod detection;
pub mod inference;
pub mod mock;
pub mod signal;

// Re-export commonly used types
pub use actuator::{Actuator, LogActuator};
pub use capture::{BlankFrameSource, Frame, FrameSource};
pub use config::TrackingConfig;
pub use core::{
    Backends, IterationOutcome, RunState, SessionPhase, Supervisor, TargetEvent, TrackingLoop,
};
pub use detection::{resolve_class_id, select_target, BoundingBox, ClassMap, Detection, Target};
pub use error::{Result, TrackerError};
pub use inference::{Detector, ModelLoader, ReplayModelLoader};
pub use signal::{CancellationSignal, CancellationToken, ExitKey, ManualSignal, StdinListener};

#[cfg(target_os = "windows")]
pub use actuator::CursorActuator;
#[cfg(feature = "vision")]
pub use capture::FrameSequenceCapture;
#[cfg(target_os = "windows")]
pub use capture::ScreenCapture;
#[cfg(target_os = "windows")]
pub use signal::KeyboardListener;
