//! Detection model seam
//!
//! The detection model itself is an external collaborator. A `ModelLoader`
//! turns an opaque model reference into a `Detector`, which is then driven
//! once per frame by the tracking loop.

mod replay;

pub use replay::{ReplayData, ReplayDetector, ReplayModelLoader};

use crate::capture::Frame;
use crate::detection::{ClassMap, Detection};
use crate::Result;

/// A loaded detection model
pub trait Detector: Send {
    /// Run inference over a frame. Failures are `TrackerError::Inference`.
    fn infer(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>>;

    /// Class id -> class name mapping exposed by the model
    fn class_names(&self) -> &ClassMap;
}

/// Loads a detector from a model reference (path or identifier)
pub trait ModelLoader: Send {
    /// Load the model. Failures are `TrackerError::ModelLoadFailed`.
    fn load(&self, reference: &str) -> Result<Box<dyn Detector>>;
}
