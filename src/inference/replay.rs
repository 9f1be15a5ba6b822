//! Replay precomputed detections
//!
//! The model reference is a JSON file holding the class map and one detection
//! list per frame:
//!
//! ```json
//! {
//!   "classes": { "0": "person", "1": "truck" },
//!   "frames": [
//!     [ { "class_id": 1, "confidence": 0.8, "box": { "x1": 10, "y1": 10, "x2": 60, "y2": 40 } } ],
//!     []
//!   ]
//! }
//! ```
//!
//! Each inference call consumes the next entry, wrapping around at the end.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Detector, ModelLoader};
use crate::capture::Frame;
use crate::detection::{ClassMap, Detection};
use crate::{Result, TrackerError};

/// Contents of a replay file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayData {
    pub classes: ClassMap,
    #[serde(default)]
    pub frames: Vec<Vec<Detection>>,
}

impl ReplayData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Loader that reads `ReplayData` from the model reference path
#[derive(Debug, Clone, Default)]
pub struct ReplayModelLoader;

impl ReplayModelLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModelLoader for ReplayModelLoader {
    fn load(&self, reference: &str) -> Result<Box<dyn Detector>> {
        let content = std::fs::read_to_string(Path::new(reference))
            .map_err(|e| TrackerError::model_load(reference, e))?;
        let data = ReplayData::from_json(&content).map_err(|e| TrackerError::model_load(reference, e))?;
        if data.classes.is_empty() {
            return Err(TrackerError::model_load(reference, "replay file defines no classes"));
        }
        Ok(Box::new(ReplayDetector::new(data)))
    }
}

/// Detector that hands out the recorded detection lists in order
pub struct ReplayDetector {
    data: ReplayData,
    cursor: usize,
}

impl ReplayDetector {
    pub fn new(data: ReplayData) -> Self {
        Self { data, cursor: 0 }
    }
}

impl Detector for ReplayDetector {
    fn infer(&mut self, _frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>> {
        if self.data.frames.is_empty() {
            return Ok(Vec::new());
        }
        let index = self.cursor % self.data.frames.len();
        self.cursor = self.cursor.wrapping_add(1);

        // A real model applies its threshold while decoding; mirror that
        Ok(self.data.frames[index]
            .iter()
            .filter(|d| d.confidence >= confidence_threshold)
            .copied()
            .collect())
    }

    fn class_names(&self) -> &ClassMap {
        &self.data.classes
    }
}
