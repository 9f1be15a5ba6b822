//! Detection data types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from class id to class name, ordered by id
pub type ClassMap = BTreeMap<u32, String>;

/// Axis-aligned box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Integer center, corners truncated before the midpoint is taken
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }
}

// Summed in i64 so extreme corners cannot overflow; the result always fits i32
fn midpoint(a: f32, b: f32) -> i32 {
    ((a as i32 as i64 + b as i32 as i64) / 2) as i32
}

impl From<[f32; 4]> for BoundingBox {
    fn from(xyxy: [f32; 4]) -> Self {
        Self::new(xyxy[0], xyxy[1], xyxy[2], xyxy[3])
    }
}

/// One object instance reported by the detector for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    /// Confidence in [0, 1]
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bbox: impl Into<BoundingBox>) -> Self {
        Self {
            class_id,
            confidence,
            bbox: bbox.into(),
        }
    }
}

/// The detection chosen for actuation in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub detection: Detection,
    /// Center point (cx, cy) the pointer is moved to
    pub center: (i32, i32),
}

impl Target {
    pub fn new(detection: Detection) -> Self {
        Self {
            center: detection.bbox.center(),
            detection,
        }
    }
}
