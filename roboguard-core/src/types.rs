//! Data exchanged between the capture, vision and navigation activities

use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

/// One captured image: `width * height` pixels, 3 bytes each, row-major RGB.
///
/// The payload is kept exactly as the camera delivered it. Whether it really
/// holds `width * height * 3` bytes is checked when the vision stage decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    sequence: u64,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(sequence: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            sequence,
            width,
            height,
            data,
        }
    }

    /// Frame with every pixel set to `color`.
    pub fn filled(sequence: u64, width: u32, height: u32, color: Rgb) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&color);
        }
        Self::new(sequence, width, height, data)
    }

    /// Monotonic capture counter assigned by the producer.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// One sample from the three-sensor range array, in millimetres.
///
/// `None` is the explicit "unavailable" marker for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub center: Option<f64>,
}

/// A reading whose three channels all carry a usable distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clearance {
    pub left: f64,
    pub right: f64,
    pub center: f64,
}

impl SensorReading {
    pub fn new(left: f64, right: f64, center: f64) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            center: Some(center),
        }
    }

    /// Returns the clearance only if every channel is present, finite and positive.
    /// Anything else is "unknown", never "no obstacle".
    pub fn validate(&self) -> Option<Clearance> {
        Some(Clearance {
            left: usable(self.left)?,
            right: usable(self.right)?,
            center: usable(self.center)?,
        })
    }
}

fn usable(channel: Option<f64>) -> Option<f64> {
    channel.filter(|mm| mm.is_finite() && *mm > 0.0)
}

/// Discrete commands understood by the drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    Forward,
    Backward,
    Stop,
    /// Positive degrees turn right (clockwise), negative turn left.
    Turn { degrees: f64 },
}

impl MotionCommand {
    pub fn turn_right(degrees: f64) -> Self {
        MotionCommand::Turn {
            degrees: degrees.abs(),
        }
    }

    pub fn turn_left(degrees: f64) -> Self {
        MotionCommand::Turn {
            degrees: -degrees.abs(),
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, MotionCommand::Stop)
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::Forward => write!(f, "forward"),
            MotionCommand::Backward => write!(f, "backward"),
            MotionCommand::Stop => write!(f, "stop"),
            MotionCommand::Turn { degrees } if *degrees >= 0.0 => {
                write!(f, "turn right {:.0}°", degrees)
            }
            MotionCommand::Turn { degrees } => write!(f, "turn left {:.0}°", -degrees),
        }
    }
}
