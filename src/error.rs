//! Error types for tracking sessions

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors produced while setting up or running a tracking session
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The detection model could not be loaded
    #[error("failed to load model '{reference}': {reason}")]
    ModelLoadFailed { reference: String, reason: String },

    /// No class exposed by the model matches the requested target
    #[error("target class '{target}' not found (available: {})", available.join(", "))]
    TargetClassNotFound { target: String, available: Vec<String> },

    /// Frame acquisition failed
    #[error("capture failed: {0}")]
    Capture(String),

    /// The detector failed on a frame
    #[error("inference failed: {0}")]
    Inference(String),

    /// Moving the pointer failed
    #[error("actuation failed: {0}")]
    Actuation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown exit key: {0}")]
    UnknownKey(String),

    #[error("a tracking session is already running")]
    AlreadyRunning,

    /// The worker thread died without reporting a result
    #[error("tracking worker panicked: {0}")]
    WorkerPanicked(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    /// Errors that abort the session during initialization
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::ModelLoadFailed { .. } | TrackerError::TargetClassNotFound { .. }
        )
    }

    /// Per-iteration errors the tracking loop absorbs and retries past
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::Capture(_) | TrackerError::Inference(_) | TrackerError::Actuation(_)
        )
    }

    pub(crate) fn model_load(reference: impl Into<String>, reason: impl ToString) -> Self {
        TrackerError::ModelLoadFailed {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TrackerError::model_load("best.pt", "missing").is_fatal());
        assert!(TrackerError::TargetClassNotFound {
            target: "tank".to_string(),
            available: vec![],
        }
        .is_fatal());
        assert!(!TrackerError::Capture("gone".to_string()).is_fatal());
        assert!(!TrackerError::AlreadyRunning.is_fatal());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(TrackerError::Capture("x".to_string()).is_recoverable());
        assert!(TrackerError::Inference("x".to_string()).is_recoverable());
        assert!(TrackerError::Actuation("x".to_string()).is_recoverable());
        assert!(!TrackerError::model_load("m", "x").is_recoverable());
    }

    #[test]
    fn test_display_lists_available_classes() {
        let err = TrackerError::TargetClassNotFound {
            target: "tank".to_string(),
            available: vec!["person".to_string(), "truck".to_string()],
        };
        let s = err.to_string();
        assert!(s.contains("tank"));
        assert!(s.contains("person, truck"));
    }
}
