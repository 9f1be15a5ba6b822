//! Core tracking abstractions
//!
//! - `TrackingLoop` - worker-side capture / detect / actuate state machine
//! - `Supervisor` - runs a loop on a worker thread and waits for it
//! - `RunState` - observable session state
//! - `TargetEvent` - emitted for every actuated target

mod events;
mod performance;
mod runner;
mod state;
mod tracking_loop;

pub use events::{EventHandler, TargetCallback, TargetEvent};
pub use performance::{PerformanceTracker, FPS_WINDOW};
pub use runner::Supervisor;
pub use state::{RunState, SessionPhase};
pub use tracking_loop::{Backends, IterationOutcome, TrackingLoop};
