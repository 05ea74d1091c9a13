//! Target colour detection and distance estimation

use super::clustering::{Color, KMeans};
use crate::error::VisionError;
use crate::utils;
use image::RgbImage;
use roboguard_core::{Frame, VisionParameters};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Axis-aligned box in working-resolution pixel coordinates (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Outcome of running detection on one frame
#[derive(Debug, Clone)]
pub struct Detection {
    pub frame_sequence: u64,
    pub detected: bool,
    /// Share of working pixels assigned to the target cluster
    pub fraction: f64,
    /// Pixel count of the target cluster
    pub area: u32,
    /// Set only when `detected`
    pub distance: Option<f64>,
    pub bbox: Option<BoundingBox>,
    /// Working frame with the detection border drawn; set only when `detected`
    pub annotated: Option<RgbImage>,
}

/// Map a target area to a distance by piecewise-linear interpolation.
///
/// Below `area_min` the target is far (`max_distance`), above `area_max` it is
/// near (`min_distance`); in between the result is
/// `min + (max - min) * (area - area_min) / (area_max - area_min)`.
pub fn estimate_distance(area: u32, params: &VisionParameters) -> f64 {
    if area < params.area_min {
        return params.max_distance;
    }
    if area > params.area_max {
        return params.min_distance;
    }
    let span = params.area_max.saturating_sub(params.area_min).max(1) as f64;
    params.min_distance
        + (params.max_distance - params.min_distance) * (area - params.area_min) as f64 / span
}

/// Downscale, cluster, select the cluster nearest the target colour, and
/// decide whether it covers enough of the frame.
pub struct ColorDetector {
    params: VisionParameters,
    kmeans: KMeans,
}

impl ColorDetector {
    pub fn new(params: VisionParameters) -> Result<Self, VisionError> {
        if params.cluster_count == 0 {
            return Err(VisionError::Config("cluster_count must be greater than 0".to_string()));
        }
        if params.working_resolution.0 == 0 || params.working_resolution.1 == 0 {
            return Err(VisionError::Config("working_resolution must be non-zero".to_string()));
        }
        let kmeans = KMeans::new(
            params.cluster_count,
            params.max_iterations,
            params.convergence_tolerance,
            params.seed,
        );
        Ok(Self { params, kmeans })
    }

    pub fn params(&self) -> &VisionParameters {
        &self.params
    }

    /// Decode and detect on a captured frame
    pub fn process(&self, frame: &Frame) -> Result<Detection, VisionError> {
        let image = utils::decode_frame(frame)?;
        let (width, height) = self.params.working_resolution;
        let working = utils::downscale(&image, width, height)?;
        self.detect(frame.sequence(), working)
    }

    /// Detect on an image already at working resolution
    pub fn detect(
        &self,
        frame_sequence: u64,
        mut working: RgbImage,
    ) -> Result<Detection, VisionError> {
        let pixels = utils::to_colors(&working);
        let clusters = self.kmeans.fit(&pixels)?;

        let target = to_color(self.params.target_color);
        let (label, center_distance) = clusters
            .nearest_center(target)
            .ok_or_else(|| VisionError::Clustering("No cluster centres".to_string()))?;

        let total = pixels.len();
        let area = if center_distance <= self.params.match_radius {
            clusters.count(label)
        } else {
            0
        };
        let fraction = area as f64 / total as f64;
        let detected = area as f64 > self.params.color_threshold * total as f64;

        debug!(
            "Frame {}: target cluster {} at {:.1} from target, {} px ({:.3}), {} iterations",
            frame_sequence, label, center_distance, area, fraction, clusters.iterations
        );

        if !detected {
            return Ok(Detection {
                frame_sequence,
                detected: false,
                fraction,
                area: area as u32,
                distance: None,
                bbox: None,
                annotated: None,
            });
        }

        let width = working.width();
        let bbox = bounding_box(&clusters.labels, label, width);
        let distance = estimate_distance(area as u32, &self.params);
        if let Some(bbox) = bbox {
            utils::draw_border(&mut working, &bbox, self.params.border_color);
        }

        Ok(Detection {
            frame_sequence,
            detected: true,
            fraction,
            area: area as u32,
            distance: Some(distance),
            bbox,
            annotated: Some(working),
        })
    }
}

fn to_color(rgb: [u8; 3]) -> Color {
    [rgb[0] as f64, rgb[1] as f64, rgb[2] as f64]
}

fn bounding_box(labels: &[usize], label: usize, width: u32) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    for (idx, _) in labels.iter().enumerate().filter(|(_, &l)| l == label) {
        let x = idx as u32 % width;
        let y = idx as u32 / width;
        bbox = Some(match bbox {
            None => BoundingBox {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
            Some(b) => BoundingBox {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        });
    }
    bbox
}
