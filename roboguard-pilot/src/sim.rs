//! Simulated hardware for running a session without a robot
//!
//! A synthetic camera, a scripted range array and a recording drive. The
//! drive can be told to fail so fault handling can be exercised end to end.

use async_trait::async_trait;
use clap::ValueEnum;
use parking_lot::Mutex;
use roboguard_core::{
    DistanceSensorArray, Frame, FrameSource, HardwareError, MotionActuator, MotionCommand, Rgb,
    SensorReading,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const BACKGROUND: Rgb = [40, 60, 50];
const TARGET: Rgb = [255, 255, 255];

/// Camera producing flat synthetic frames, optionally with a white target
/// patch in the middle of the view.
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    next_sequence: u64,
    target_in_view: bool,
    failures_remaining: u32,
    released: Arc<AtomicBool>,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_sequence: 0,
            target_in_view: false,
            failures_remaining: 0,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_target(mut self, in_view: bool) -> Self {
        self.target_in_view = in_view;
        self
    }

    /// Fail the first `count` captures
    pub fn with_failures(mut self, count: u32) -> Self {
        self.failures_remaining = count;
        self
    }

    /// Flag set once the camera has been released
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    fn render(&self, sequence: u64) -> Frame {
        let frame = Frame::filled(sequence, self.width, self.height, BACKGROUND);
        if !self.target_in_view {
            return frame;
        }

        // Centred patch, three eighths of each dimension
        let (w, h) = (self.width * 3 / 8, self.height * 3 / 8);
        let (x0, y0) = ((self.width - w) / 2, (self.height - h) / 2);
        let mut data = frame.into_data();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let i = ((y * self.width + x) * 3) as usize;
                data[i..i + 3].copy_from_slice(&TARGET);
            }
        }
        Frame::new(sequence, self.width, self.height, data)
    }
}

#[async_trait]
impl FrameSource for SimulatedCamera {
    async fn capture(&mut self) -> Result<Frame, HardwareError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(HardwareError::Fault("camera already released".to_string()));
        }
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(HardwareError::Unavailable("no frame ready".to_string()));
        }
        self.next_sequence += 1;
        Ok(self.render(self.next_sequence))
    }

    async fn release(&mut self) -> Result<(), HardwareError> {
        self.released.store(true, Ordering::SeqCst);
        info!("Simulated camera released");
        Ok(())
    }
}

/// Which range sensor sees the simulated obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleSide {
    Left,
    Center,
    Right,
}

/// Range array replaying a script, then holding its last reading
pub struct SimulatedRangeArray {
    script: VecDeque<SensorReading>,
    steady: SensorReading,
}

impl SimulatedRangeArray {
    /// Every channel reports `mm`
    pub fn clear(mm: f64) -> Self {
        Self::scripted(vec![], SensorReading::new(mm, mm, mm))
    }

    /// One channel reports `distance_mm`, the others report `open_mm`
    pub fn with_obstacle(side: ObstacleSide, distance_mm: f64, open_mm: f64) -> Self {
        let mut reading = SensorReading::new(open_mm, open_mm, open_mm);
        match side {
            ObstacleSide::Left => reading.left = Some(distance_mm),
            ObstacleSide::Center => reading.center = Some(distance_mm),
            ObstacleSide::Right => reading.right = Some(distance_mm),
        }
        Self::scripted(vec![], reading)
    }

    pub fn scripted(script: Vec<SensorReading>, steady: SensorReading) -> Self {
        Self {
            script: script.into(),
            steady,
        }
    }
}

#[async_trait]
impl DistanceSensorArray for SimulatedRangeArray {
    async fn read(&mut self) -> Result<SensorReading, HardwareError> {
        Ok(self.script.pop_front().unwrap_or(self.steady))
    }
}

/// Shared view of every command a [`SimulatedDrive`] accepted
#[derive(Debug, Clone, Default)]
pub struct DriveLog {
    commands: Arc<Mutex<Vec<MotionCommand>>>,
}

impl DriveLog {
    pub fn commands(&self) -> Vec<MotionCommand> {
        self.commands.lock().clone()
    }

    pub fn count(&self, command: MotionCommand) -> usize {
        self.commands.lock().iter().filter(|c| **c == command).count()
    }

    pub fn last(&self) -> Option<MotionCommand> {
        self.commands.lock().last().copied()
    }

    fn record(&self, command: MotionCommand) {
        self.commands.lock().push(command);
    }
}

/// Drive that logs and records commands instead of moving.
///
/// `Stop` is always accepted, so a faulted drive can still be halted.
#[derive(Debug, Default)]
pub struct SimulatedDrive {
    log: DriveLog,
    fail_initialize: bool,
    fail_after: Option<usize>,
    accepted: usize,
}

impl SimulatedDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    /// Reject every motion command after the first `count`
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn log(&self) -> DriveLog {
        self.log.clone()
    }
}

#[async_trait]
impl MotionActuator for SimulatedDrive {
    async fn initialize(&mut self) -> Result<(), HardwareError> {
        if self.fail_initialize {
            return Err(HardwareError::Initialization(
                "motor controller not responding".to_string(),
            ));
        }
        info!("Simulated drive ready");
        Ok(())
    }

    async fn command(&mut self, command: MotionCommand) -> Result<(), HardwareError> {
        if !command.is_stop() && self.fail_after.is_some_and(|n| self.accepted >= n) {
            return Err(HardwareError::Fault(format!("drive rejected {}", command)));
        }
        self.accepted += 1;
        debug!("Simulated drive: {}", command);
        self.log.record(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_camera_frames_are_sequenced() {
        let mut camera = SimulatedCamera::new(32, 24);
        let first = camera.capture().await.unwrap();
        let second = camera.capture().await.unwrap();
        assert_eq!((first.sequence(), second.sequence()), (1, 2));
        assert_eq!(first.data().len(), 32 * 24 * 3);
        assert!(first.data().chunks(3).all(|px| px == BACKGROUND));
    }

    #[tokio::test]
    async fn test_camera_target_patch() {
        let mut camera = SimulatedCamera::new(32, 24).with_target(true);
        let frame = camera.capture().await.unwrap();
        let white = frame.data().chunks(3).filter(|px| *px == TARGET).count();
        assert_eq!(white, 12 * 9);
    }

    #[tokio::test]
    async fn test_camera_failures_then_release() {
        let mut camera = SimulatedCamera::new(8, 8).with_failures(2);
        let released = camera.release_flag();
        assert!(camera.capture().await.is_err());
        assert!(camera.capture().await.is_err());
        assert!(camera.capture().await.is_ok());

        camera.release().await.unwrap();
        assert!(released.load(Ordering::SeqCst));
        assert!(camera.capture().await.is_err());
    }

    #[tokio::test]
    async fn test_range_array_obstacle_side() {
        let mut sensors = SimulatedRangeArray::with_obstacle(ObstacleSide::Right, 120.0, 900.0);
        let reading = sensors.read().await.unwrap();
        assert_eq!(reading, SensorReading::new(900.0, 120.0, 900.0));
    }

    #[tokio::test]
    async fn test_range_array_script_then_steady() {
        let mut sensors = SimulatedRangeArray::scripted(
            vec![SensorReading::default()],
            SensorReading::new(500.0, 500.0, 500.0),
        );
        assert_eq!(sensors.read().await.unwrap().validate(), None);
        assert!(sensors.read().await.unwrap().validate().is_some());
        assert!(sensors.read().await.unwrap().validate().is_some());
    }

    #[tokio::test]
    async fn test_drive_fault_injection_still_accepts_stop() {
        let mut drive = SimulatedDrive::new().failing_after(1);
        let log = drive.log();
        drive.command(MotionCommand::Forward).await.unwrap();
        assert!(drive.command(MotionCommand::Forward).await.is_err());
        drive.command(MotionCommand::Stop).await.unwrap();
        assert_eq!(log.commands(), vec![MotionCommand::Forward, MotionCommand::Stop]);
    }

    #[tokio::test]
    async fn test_drive_initialize_failure() {
        let mut drive = SimulatedDrive::new().failing_initialize();
        let err = drive.initialize().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
