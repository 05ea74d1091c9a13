//! Contracts for the hardware the core drives but does not own
//!
//! Camera, range sensors and drive are external collaborators: the core only
//! relies on the call/return behaviour described here. Real drivers and the
//! simulated devices in `roboguard-pilot` both implement these traits.

use crate::error::HardwareError;
use crate::types::{Frame, MotionCommand, SensorReading};
use async_trait::async_trait;

/// Produces frames on demand at a fixed resolution.
#[async_trait]
pub trait FrameSource: Send {
    /// Best-effort capture of the next RGB frame
    async fn capture(&mut self) -> Result<Frame, HardwareError>;

    /// Release the camera handle. Called once, after capture has stopped.
    async fn release(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// Three independent range sensors (left, right, center).
#[async_trait]
pub trait DistanceSensorArray: Send {
    /// Read all three channels; a channel may be individually unavailable
    async fn read(&mut self) -> Result<SensorReading, HardwareError>;
}

/// Accepts discrete motion commands.
///
/// Fire-and-forget: a command is assumed to have executed before the same
/// caller issues the next one.
#[async_trait]
pub trait MotionActuator: Send {
    /// Bring the drive up. A failure here is fatal for the session.
    async fn initialize(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }

    async fn command(&mut self, command: MotionCommand) -> Result<(), HardwareError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDrive {
        commands: Vec<MotionCommand>,
    }

    #[async_trait]
    impl MotionActuator for CountingDrive {
        async fn command(&mut self, command: MotionCommand) -> Result<(), HardwareError> {
            self.commands.push(command);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_initialize_succeeds() {
        let mut drive: Box<dyn MotionActuator> = Box::new(CountingDrive { commands: vec![] });
        drive.initialize().await.unwrap();
        drive.command(MotionCommand::Forward).await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_reach_driver_in_order() {
        let mut drive = CountingDrive { commands: vec![] };
        drive.command(MotionCommand::turn_right(90.0)).await.unwrap();
        drive.command(MotionCommand::Stop).await.unwrap();
        assert_eq!(
            drive.commands,
            vec![MotionCommand::Turn { degrees: 90.0 }, MotionCommand::Stop]
        );
    }
}
