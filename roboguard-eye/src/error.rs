//! Error types for roboguard-eye

use roboguard_core::{Error as CoreError, HardwareError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera error: {0}")]
    Camera(#[from] HardwareError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Resize error: {0}")]
    Resize(String),

    #[error("Clustering error: {0}")]
    Clustering(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Camera(hw) => CoreError::Hardware(hw),
            VisionError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::Configuration(format!("Vision error: {}", other)),
        }
    }
}
