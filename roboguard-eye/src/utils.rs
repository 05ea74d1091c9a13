//! Utility functions for vision processing

use crate::error::VisionError;
use crate::processing::{BoundingBox, Color};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use roboguard_core::{Frame, Rgb as RgbTriple};

/// Interpret a captured frame as an RGB image
pub fn decode_frame(frame: &Frame) -> Result<RgbImage, VisionError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(VisionError::Decode(format!(
            "Frame {} has invalid dimensions {}x{}",
            frame.sequence(),
            width,
            height
        )));
    }

    let expected = (width as u64)
        .checked_mul(height as u64)
        .and_then(|p| p.checked_mul(3))
        .ok_or_else(|| VisionError::Decode("Frame dimensions overflow".to_string()))?;
    if frame.data().len() as u64 != expected {
        return Err(VisionError::Decode(format!(
            "Frame {} carries {} bytes, expected {}",
            frame.sequence(),
            frame.data().len(),
            expected
        )));
    }

    RgbImage::from_raw(width, height, frame.data().to_vec())
        .ok_or_else(|| VisionError::Decode(format!("Frame {} buffer rejected", frame.sequence())))
}

/// Resize to the working resolution with a smoothing filter
pub fn downscale(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage, VisionError> {
    if width == 0 || height == 0 {
        return Err(VisionError::Resize("Target dimensions cannot be zero".to_string()));
    }
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, FilterType::Triangle))
}

/// Flatten to row-major RGB triples for clustering
pub fn to_colors(image: &RgbImage) -> Vec<Color> {
    image
        .pixels()
        .map(|p| [p[0] as f64, p[1] as f64, p[2] as f64])
        .collect()
}

/// One-pixel border along the edges of `bbox`
pub fn draw_border(image: &mut RgbImage, bbox: &BoundingBox, color: RgbTriple) {
    let color = Rgb(color);
    let max_x = bbox.max_x.min(image.width().saturating_sub(1));
    let max_y = bbox.max_y.min(image.height().saturating_sub(1));
    if image.width() == 0 || image.height() == 0 || bbox.min_x > max_x || bbox.min_y > max_y {
        return;
    }

    for x in bbox.min_x..=max_x {
        image.put_pixel(x, bbox.min_y, color);
        image.put_pixel(x, max_y, color);
    }
    for y in bbox.min_y..=max_y {
        image.put_pixel(bbox.min_x, y, color);
        image.put_pixel(max_x, y, color);
    }
}
