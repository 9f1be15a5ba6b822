//! Target class name resolution
//!
//! Runs once when a session initializes. The model exposes an id -> name map;
//! the caller supplies a human-readable name such as "Truck" or "phone".

use super::types::ClassMap;
use crate::{Result, TrackerError};

/// Resolve a human-readable target name to a class id.
///
/// An exact case-insensitive match is preferred. Failing that, the first id
/// (ascending) whose name contains the target, or is contained in it, is used.
pub fn resolve_class_id(target: &str, classes: &ClassMap) -> Result<u32> {
    let target_lower = target.trim().to_lowercase();

    if let Some((&id, _)) = classes
        .iter()
        .find(|(_, name)| name.to_lowercase() == target_lower)
    {
        return Ok(id);
    }

    if !target_lower.is_empty() {
        let partial = classes.iter().find(|(_, name)| {
            let name_lower = name.to_lowercase();
            !name_lower.is_empty()
                && (name_lower.contains(&target_lower) || target_lower.contains(&name_lower))
        });
        if let Some((&id, name)) = partial {
            log::warn!(
                "No exact class match for '{}', using closest class {}: {}",
                target,
                id,
                name
            );
            return Ok(id);
        }
    }

    Err(TrackerError::TargetClassNotFound {
        target: target.to_string(),
        available: classes.values().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(entries: &[(u32, &str)]) -> ClassMap {
        entries.iter().map(|&(id, name)| (id, name.to_string())).collect()
    }

    #[test]
    fn test_exact_case_insensitive() {
        let map = classes(&[(0, "person"), (1, "truck")]);
        assert_eq!(resolve_class_id("Truck", &map).unwrap(), 1);
        assert_eq!(resolve_class_id("PERSON", &map).unwrap(), 0);
    }

    #[test]
    fn test_substring_fallback() {
        let map = classes(&[(0, "cell phone")]);
        assert_eq!(resolve_class_id("phone", &map).unwrap(), 0);
    }

    #[test]
    fn test_target_contains_class_name() {
        let map = classes(&[(0, "person"), (4, "tank")]);
        assert_eq!(resolve_class_id("tank destroyer", &map).unwrap(), 4);
    }

    #[test]
    fn test_exact_beats_earlier_substring() {
        // "car" is a substring of "sports car" (id 2) but an exact match exists at id 5
        let map = classes(&[(2, "sports car"), (5, "Car")]);
        assert_eq!(resolve_class_id("car", &map).unwrap(), 5);
    }

    #[test]
    fn test_ambiguous_substring_takes_lowest_id() {
        let map = classes(&[(9, "fire truck"), (3, "pickup truck")]);
        assert_eq!(resolve_class_id("truck", &map).unwrap(), 3);
    }

    #[test]
    fn test_not_found() {
        let map = classes(&[(0, "person"), (1, "truck")]);
        match resolve_class_id("Tank", &map) {
            Err(TrackerError::TargetClassNotFound { target, available }) => {
                assert_eq!(target, "Tank");
                assert_eq!(available, vec!["person", "truck"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_map() {
        let err = resolve_class_id("truck", &ClassMap::new()).unwrap_err();
        assert!(err.is_fatal());
    }
}
