//! Detections, target selection and class resolution

mod classes;
mod selector;
mod types;

pub use classes::resolve_class_id;
pub use selector::select_target;
pub use types::{BoundingBox, ClassMap, Detection, Target};
