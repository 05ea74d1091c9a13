//! Error types for roboguard-nav

use roboguard_core::{Error as CoreError, HardwareError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    /// The drive rejected a command. Always fatal for the session.
    #[error("Actuator error: {0}")]
    Actuator(HardwareError),
}

impl From<NavError> for CoreError {
    fn from(err: NavError) -> Self {
        match err {
            NavError::Actuator(hw) => CoreError::Hardware(hw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_error_display() {
        let err = NavError::Actuator(HardwareError::Fault("wheel stalled".to_string()));
        assert!(err.to_string().contains("Actuator error"));
        assert!(err.to_string().contains("wheel stalled"));
    }

    #[test]
    fn test_nav_error_to_core_error() {
        let core: CoreError =
            NavError::Actuator(HardwareError::Unavailable("bus".to_string())).into();
        assert!(matches!(core, CoreError::Hardware(HardwareError::Unavailable(_))));
    }
}
