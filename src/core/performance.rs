//! Rolling throughput counters
//!
//! Frame rate is measured over non-overlapping windows of at least one
//! second. `current_fps` only changes when a window closes, so a partially
//! filled window never produces a reading.

use std::time::{Duration, Instant};

use super::state::RunState;

/// Minimum length of a measurement window
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Frame, detection and error counters owned by the tracking loop
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    frames_in_window: u64,
    window_start: Instant,
    current_fps: f64,
    frames_total: u64,
    detections_total: u64,
    errors_total: u64,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Tracker whose first window opens at `start`
    pub fn starting_at(start: Instant) -> Self {
        Self {
            frames_in_window: 0,
            window_start: start,
            current_fps: 0.0,
            frames_total: 0,
            detections_total: 0,
            errors_total: 0,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_in_window += 1;
        self.frames_total += 1;
    }

    pub fn record_detection(&mut self) {
        self.detections_total += 1;
    }

    pub fn record_error(&mut self) {
        self.errors_total += 1;
    }

    /// Close the window if it has lasted at least `FPS_WINDOW`.
    ///
    /// Returns the new frame rate when a window closed.
    pub fn update(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        self.current_fps = self.frames_in_window as f64 / elapsed.as_secs_f64();
        self.frames_in_window = 0;
        self.window_start = now;
        Some(self.current_fps)
    }

    pub fn current_fps(&self) -> f64 {
        self.current_fps
    }

    pub fn frames_in_window(&self) -> u64 {
        self.frames_in_window
    }

    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total
    }

    pub fn detections_total(&self) -> u64 {
        self.detections_total
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total
    }

    /// Copy the counters into a run state snapshot
    pub fn fill(&self, state: &mut RunState) {
        state.current_fps = self.current_fps;
        state.frames_in_window = self.frames_in_window;
        state.frames_total = self.frames_total;
        state.detections_total = self.detections_total;
        state.errors_total = self.errors_total;
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reading_from_partial_window() {
        let start = Instant::now();
        let mut perf = PerformanceTracker::starting_at(start);
        for _ in 0..30 {
            perf.record_frame();
        }

        assert_eq!(perf.update(start + Duration::from_millis(999)), None);
        assert_eq!(perf.current_fps(), 0.0);
        assert_eq!(perf.frames_in_window(), 30);
    }

    #[test]
    fn test_window_closes_and_resets() {
        let start = Instant::now();
        let mut perf = PerformanceTracker::starting_at(start);
        for _ in 0..5 {
            perf.record_frame();
        }

        let close = start + Duration::from_secs(1);
        assert_eq!(perf.update(close), Some(5.0));
        assert_eq!(perf.frames_in_window(), 0);
        assert_eq!(perf.window_start(), close);

        // The next window is measured from the close point
        for _ in 0..3 {
            perf.record_frame();
        }
        assert_eq!(perf.update(close + Duration::from_millis(500)), None);
        assert_eq!(perf.current_fps(), 5.0);
        assert_eq!(perf.update(close + Duration::from_millis(1500)), Some(2.0));
    }

    #[test]
    fn test_window_frames_sum_to_recorded_frames() {
        let start = Instant::now();
        let mut perf = PerformanceTracker::starting_at(start);
        let mut closed_sum = 0.0;
        let mut recorded = 0u64;

        for second in 1..=4u64 {
            for _ in 0..(second * 2) {
                perf.record_frame();
                recorded += 1;
            }
            let fps = perf.update(start + Duration::from_secs(second)).unwrap();
            // Each window is exactly one second, so fps equals its frame count
            closed_sum += fps;
        }

        assert_eq!(closed_sum as u64 + perf.frames_in_window(), recorded);
        assert_eq!(perf.frames_total(), recorded);
    }

    #[test]
    fn test_counters_and_fill() {
        let mut perf = PerformanceTracker::new();
        perf.record_frame();
        perf.record_frame();
        perf.record_detection();
        perf.record_error();

        let mut state = RunState::new();
        perf.fill(&mut state);
        assert_eq!(state.frames_total, 2);
        assert_eq!(state.frames_in_window, 2);
        assert_eq!(state.detections_total, 1);
        assert_eq!(state.errors_total, 1);
    }
}
