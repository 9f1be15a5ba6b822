//! Pointer actuation

#[cfg(target_os = "windows")]
mod cursor;

#[cfg(target_os = "windows")]
pub use cursor::CursorActuator;

use std::time::Duration;

use crate::Result;

/// Moves a pointer toward a screen coordinate
pub trait Actuator: Send {
    /// Move to (x, y) over `duration`, blocking until the move completes.
    /// Failures are `TrackerError::Actuation`.
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<()>;
}

/// Actuator that only logs the requested moves (dry runs, headless hosts)
#[derive(Debug, Default)]
pub struct LogActuator {
    moves: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of moves requested so far
    pub fn moves(&self) -> u64 {
        self.moves
    }
}

impl Actuator for LogActuator {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<()> {
        self.moves += 1;
        log::info!("Move pointer to ({}, {}) over {:?}", x, y, duration);
        Ok(())
    }
}
