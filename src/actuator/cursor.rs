//! System cursor actuator (Windows)

use std::thread;
use std::time::{Duration, Instant};

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use super::Actuator;
use crate::{Result, TrackerError};

/// Interpolation step while gliding the cursor
const STEP_INTERVAL: Duration = Duration::from_millis(5);

/// Moves the system cursor in a straight line over the requested duration
#[derive(Debug, Default)]
pub struct CursorActuator;

impl CursorActuator {
    pub fn new() -> Self {
        Self
    }

    fn position() -> Result<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| TrackerError::Actuation(format!("GetCursorPos failed: {}", e)))?;
        Ok((point.x, point.y))
    }

    fn set(x: i32, y: i32) -> Result<()> {
        unsafe { SetCursorPos(x, y) }
            .map_err(|e| TrackerError::Actuation(format!("SetCursorPos({}, {}) failed: {}", x, y, e)))
    }
}

impl Actuator for CursorActuator {
    fn move_to(&mut self, x: i32, y: i32, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return Self::set(x, y);
        }

        let (start_x, start_y) = Self::position()?;
        let start = Instant::now();
        loop {
            let t = (start.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0);
            let cx = start_x + ((x - start_x) as f64 * t).round() as i32;
            let cy = start_y + ((y - start_y) as f64 * t).round() as i32;
            Self::set(cx, cy)?;
            if t >= 1.0 {
                return Ok(());
            }
            thread::sleep(STEP_INTERVAL);
        }
    }
}
