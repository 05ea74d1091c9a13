//! Latest detection result shared between vision and navigation

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Most recently published vision result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionState {
    pub object_detected: bool,
    /// Always within `[min_distance, max_distance]`. Keeps its last value
    /// while nothing is detected.
    pub estimated_distance: f64,
    /// Frame the state was derived from; `None` until the first publish
    pub frame_sequence: Option<u64>,
}

/// Lock-guarded cell holding the latest [`DetectionState`].
///
/// Written only by the vision processor, read by the navigation controller.
/// Last write wins; readers may observe a stale value.
#[derive(Debug, Clone)]
pub struct SharedDetection {
    inner: Arc<RwLock<DetectionState>>,
}

impl SharedDetection {
    /// Start with nothing detected and the target treated as far away
    pub fn new(initial_distance: f64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(DetectionState {
                object_detected: false,
                estimated_distance: initial_distance,
                frame_sequence: None,
            })),
        }
    }

    /// Replace the state with a detection
    pub fn publish_detected(&self, frame_sequence: u64, estimated_distance: f64) {
        *self.inner.write() = DetectionState {
            object_detected: true,
            estimated_distance,
            frame_sequence: Some(frame_sequence),
        };
    }

    /// Record that the frame showed no target; the distance estimate is kept
    pub fn publish_clear(&self, frame_sequence: u64) {
        let mut state = self.inner.write();
        state.object_detected = false;
        state.frame_sequence = Some(frame_sequence);
    }

    pub fn snapshot(&self) -> DetectionState {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let shared = SharedDetection::new(100.0);
        let state = shared.snapshot();
        assert!(!state.object_detected);
        assert_eq!(state.estimated_distance, 100.0);
        assert_eq!(state.frame_sequence, None);
    }

    #[test]
    fn test_clear_keeps_previous_distance() {
        let shared = SharedDetection::new(100.0);
        shared.publish_detected(3, 42.5);
        shared.publish_clear(4);
        let state = shared.snapshot();
        assert!(!state.object_detected);
        assert_eq!(state.estimated_distance, 42.5);
        assert_eq!(state.frame_sequence, Some(4));
    }

    #[test]
    fn test_clones_share_state() {
        let writer = SharedDetection::new(100.0);
        let reader = writer.clone();
        writer.publish_detected(1, 10.0);
        assert!(reader.snapshot().object_detected);
    }
}
