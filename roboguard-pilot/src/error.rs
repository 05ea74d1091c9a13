//! Error types for a roboguard session

use roboguard_core::{Error as CoreError, HardwareError};
use roboguard_eye::VisionError;
use roboguard_nav::NavError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Actuator initialization failed: {0}")]
    ActuatorInit(HardwareError),

    #[error("Navigation failed: {0}")]
    Navigation(#[from] NavError),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for SessionError {
    fn from(err: CoreError) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<VisionError> for SessionError {
    fn from(err: VisionError) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(err: tokio::task::JoinError) -> Self {
        SessionError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::ActuatorInit(HardwareError::Initialization(
            "no motor controller".to_string(),
        ));
        assert!(err.to_string().contains("Actuator initialization failed"));
        assert!(err.to_string().contains("no motor controller"));
    }

    #[test]
    fn test_core_error_becomes_config() {
        let err: SessionError =
            CoreError::Configuration("queue_capacity must be > 0".to_string()).into();
        assert!(matches!(err, SessionError::Config(msg) if msg.contains("queue_capacity")));
    }
}
