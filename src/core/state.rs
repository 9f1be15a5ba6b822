//! Session phase and run state types

use serde::{Deserialize, Serialize};

/// Phase of a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Loading the detector and resolving the target class
    Initializing,
    /// One throwaway inference on a zero frame
    Warming,
    /// Steady-state capture / detect / actuate loop
    Running,
    /// Cancellation observed, winding down
    Stopping,
    /// Terminal. Also the phase of a supervisor with no session yet.
    #[default]
    Stopped,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Stopped)
    }
}

/// Observable state of a tracking session.
///
/// The worker thread produces these snapshots; the supervisor and any other
/// observer only ever read copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// One-shot stop flag as last seen by the worker
    pub stop_requested: bool,
    pub phase: SessionPhase,
    /// Frames per second over the last completed 1-second window
    pub current_fps: f64,
    /// Frames processed in the window that is still open
    pub frames_in_window: u64,
    /// Frames fully processed this session
    pub frames_total: u64,
    /// Targets actuated this session
    pub detections_total: u64,
    /// Recoverable per-iteration failures this session
    pub errors_total: u64,
    /// Center of the most recent actuated target
    pub last_target: Option<(i32, i32)>,
    /// Cause of a fatal initialization error, if the session aborted
    pub fatal_error: Option<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State published when a new session starts
    pub fn starting() -> Self {
        Self {
            phase: SessionPhase::Initializing,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        !self.phase.is_terminal()
    }
}
