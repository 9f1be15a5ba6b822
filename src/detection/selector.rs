//! Per-frame target selection

use super::types::{Detection, Target};

/// Pick the target for one frame.
///
/// Detections of another class, or with confidence not strictly above the
/// threshold, are discarded. Of the rest the largest box wins; on equal area
/// the earliest detection in input order is kept.
pub fn select_target(
    detections: &[Detection],
    target_class_id: u32,
    confidence_threshold: f32,
) -> Option<Target> {
    let mut best: Option<&Detection> = None;

    for det in detections {
        if det.class_id != target_class_id || det.confidence <= confidence_threshold {
            continue;
        }
        match best {
            Some(current) if det.bbox.area() <= current.bbox.area() => {}
            _ => best = Some(det),
        }
    }

    best.copied().map(Target::new)
}
