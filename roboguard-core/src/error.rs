use thiserror::Error;

/// Faults reported by the external collaborators (camera, range sensors, drive).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    /// Transient condition; the caller retries on its next cycle.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("Device fault: {0}")]
    Fault(String),

    #[error("Device initialization failed: {0}")]
    Initialization(String),
}

impl HardwareError {
    /// Fatal faults end the session; transient ones are retried locally.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HardwareError::Unavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

pub type Result<T> = std::result::Result<T, Error>;
