//! Tracking session configuration
//!
//! A `TrackingConfig` is created once at session start and stays immutable for
//! the lifetime of the session. It can be built in code, or loaded from TOML:
//!
//! ```toml
//! target_class = "truck"
//! model = "detections.json"
//! exit_key = "q"
//! poll_interval_secs = 0.02
//! confidence_threshold = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Result, TrackerError};

/// Configuration for one tracking session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Human-readable name of the class to follow
    pub target_class: String,
    /// Opaque model reference handed to the model loader
    pub model: String,
    /// Key that ends the session
    pub exit_key: String,
    /// Fixed sleep between iterations
    pub poll_interval_secs: f64,
    /// Detections must score strictly above this
    pub confidence_threshold: f32,
    /// Duration of each pointer move
    pub move_duration_secs: f64,
    /// Sleep after a recoverable per-iteration error
    pub error_backoff_secs: f64,
    /// Side length of the square zero frame used for warm-up
    pub warmup_size: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            target_class: "truck".to_string(),
            model: "yolov8s.pt".to_string(),
            exit_key: "esc".to_string(),
            poll_interval_secs: 0.05,
            confidence_threshold: 0.4,
            move_duration_secs: 0.1,
            error_backoff_secs: 1.0,
            warmup_size: 640,
        }
    }
}

impl TrackingConfig {
    /// Create a configuration for a target class and model, other fields defaulted
    pub fn new(target_class: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            target_class: target_class.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Parse from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn with_exit_key(mut self, key: impl Into<String>) -> Self {
        self.exit_key = key.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs_f64();
        self
    }

    pub fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_move_duration(mut self, duration: Duration) -> Self {
        self.move_duration_secs = duration.as_secs_f64();
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff_secs = backoff.as_secs_f64();
        self
    }

    pub fn with_warmup_size(mut self, size: u32) -> Self {
        self.warmup_size = size;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        secs_to_duration(self.poll_interval_secs)
    }

    pub fn move_duration(&self) -> Duration {
        secs_to_duration(self.move_duration_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        secs_to_duration(self.error_backoff_secs)
    }

    /// Check the configuration before a session is started
    pub fn validate(&self) -> Result<()> {
        if self.target_class.trim().is_empty() {
            return Err(TrackerError::InvalidConfig("target_class is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(TrackerError::InvalidConfig("model is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(TrackerError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        for (name, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("move_duration_secs", self.move_duration_secs),
            ("error_backoff_secs", self.error_backoff_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::InvalidConfig(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.warmup_size == 0 {
            return Err(TrackerError::InvalidConfig("warmup_size must be non-zero".to_string()));
        }
        Ok(())
    }
}

// Callers validate first; anything unrepresentable collapses to zero.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
