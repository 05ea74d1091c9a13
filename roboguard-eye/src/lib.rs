//! roboguard-eye: perception for the roboguard robot
//!
//! Captures frames into a bounded drop-oldest queue, clusters the colours of
//! each frame to find the target, estimates its distance from the pixel area,
//! and publishes the latest result for the navigation controller.

pub mod camera;
pub mod detection_state;
pub mod error;
pub mod frame_queue;
pub mod processing;
pub mod vision_processor;
mod utils;

pub use camera::{CaptureStats, FrameCapture};
pub use detection_state::{DetectionState, SharedDetection};
pub use error::VisionError;
pub use frame_queue::BoundedFrameQueue;
pub use processing::{estimate_distance, BoundingBox, ColorDetector, Detection};
pub use vision_processor::{AnnotatedFrame, VisionProcessor, VisionStats};
