//! Colour clustering and target detection

pub mod clustering;
pub mod detection;

pub use clustering::{Color, ColorClusters, KMeans};
pub use detection::{estimate_distance, BoundingBox, ColorDetector, Detection};
