//! Session orchestration
//!
//! Runs capture, vision and navigation as three tokio tasks sharing the frame
//! queue and the detection state. The session ends when the run duration
//! elapses, the shutdown future resolves, or navigation fails. Teardown
//! order is fixed: raise the stop signal, join navigation (which always
//! issues the final drive stop), join vision and capture, then release the
//! camera.

use crate::error::SessionError;
use async_trait::async_trait;
use roboguard_core::{
    stop_channel, DistanceSensorArray, FrameSource, HardwareError, MotionActuator, MotionCommand,
    Parameters,
};
use roboguard_eye::{
    AnnotatedFrame, BoundedFrameQueue, FrameCapture, SharedDetection, VisionProcessor,
};
use roboguard_nav::{NavigationController, NavigationSummary};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// The three external collaborators a session drives
pub struct Hardware {
    pub camera: Box<dyn FrameSource>,
    pub sensors: Box<dyn DistanceSensorArray>,
    pub actuator: Box<dyn MotionActuator>,
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    DurationElapsed,
    Interrupted,
    NavigationFinished,
}

/// Counters collected from every activity once the session has quiesced
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub ended_by: SessionEnd,
    pub elapsed: Duration,
    pub frames_captured: u64,
    pub capture_failures: u64,
    pub frames_evicted: u64,
    pub frames_processed: u64,
    pub frames_discarded: u64,
    pub detections: u64,
    pub navigation: NavigationSummary,
}

/// Drive handle shared by the navigation task and the orchestrator, so the
/// drive can still be stopped if that task dies.
#[derive(Clone)]
struct SharedDrive(Arc<Mutex<Box<dyn MotionActuator>>>);

#[async_trait]
impl MotionActuator for SharedDrive {
    async fn initialize(&mut self) -> Result<(), HardwareError> {
        self.0.lock().await.initialize().await
    }

    async fn command(&mut self, command: MotionCommand) -> Result<(), HardwareError> {
        self.0.lock().await.command(command).await
    }
}

pub struct Orchestrator {
    params: Parameters,
    hardware: Hardware,
    queue: Arc<BoundedFrameQueue>,
    detection: SharedDetection,
    processor: VisionProcessor,
}

impl Orchestrator {
    /// Validates the parameters and wires the shared state. Nothing touches
    /// the hardware until [`Orchestrator::run`].
    pub fn new(params: Parameters, hardware: Hardware) -> Result<Self, SessionError> {
        params.validate()?;

        let queue = Arc::new(BoundedFrameQueue::new(params.session.queue_capacity));
        let detection = SharedDetection::new(params.vision.max_distance);
        let processor =
            VisionProcessor::new(queue.clone(), detection.clone(), params.vision.clone())?;

        Ok(Self {
            params,
            hardware,
            queue,
            detection,
            processor,
        })
    }

    /// Latest annotated frame, for an optional viewer
    pub fn subscribe_preview(&self) -> watch::Receiver<Option<Arc<AnnotatedFrame>>> {
        self.processor.subscribe_preview()
    }

    pub fn detection(&self) -> SharedDetection {
        self.detection.clone()
    }

    /// Run for the configured duration
    pub async fn run(self) -> Result<SessionReport, SessionError> {
        self.run_until(std::future::pending()).await
    }

    /// Run for the configured duration or until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<SessionReport, SessionError>
    where
        F: Future<Output = ()>,
    {
        let Orchestrator {
            params,
            hardware,
            queue,
            detection,
            processor,
        } = self;
        let Hardware {
            mut camera,
            sensors,
            mut actuator,
        } = hardware;

        if let Err(e) = actuator.initialize().await {
            error!("Drive initialization failed: {}", e);
            if let Err(stop_err) = actuator.command(MotionCommand::Stop).await {
                warn!("Stop after failed initialization also failed: {}", stop_err);
            }
            release_camera(camera.as_mut()).await;
            return Err(SessionError::ActuatorInit(e));
        }

        let run_duration = params.session.run_duration();
        info!("Session starting ({:?})", run_duration);
        let started = Instant::now();
        let (trigger, signal) = stop_channel();

        let capture = FrameCapture::new(camera, queue.clone(), &params.session);
        let capture_task = tokio::spawn(capture.run(signal.clone()));
        let vision_task = tokio::spawn(processor.run(signal.clone()));
        let drive = SharedDrive(Arc::new(Mutex::new(actuator)));
        let controller = NavigationController::new(
            sensors,
            Box::new(drive.clone()),
            detection,
            params.navigation,
        );
        let mut nav_task = tokio::spawn(controller.run(signal));

        tokio::pin!(shutdown);
        let mut nav_result = None;
        let ended_by = tokio::select! {
            _ = tokio::time::sleep(run_duration) => {
                info!("Session duration elapsed");
                SessionEnd::DurationElapsed
            }
            _ = &mut shutdown => {
                info!("Interrupt received, stopping session");
                SessionEnd::Interrupted
            }
            result = &mut nav_task => {
                nav_result = Some(result);
                SessionEnd::NavigationFinished
            }
        };

        trigger.trigger();

        // Navigation first: its exit path sends the final drive stop
        let nav_result = match nav_result {
            Some(result) => result,
            None => nav_task.await,
        };
        if let Err(e) = &nav_result {
            error!("Navigation task failed: {}, stopping drive", e);
            if let Err(stop_err) = drive.clone().command(MotionCommand::Stop).await {
                error!("Failed to stop drive after navigation failure: {}", stop_err);
            }
        }
        let vision_result = vision_task.await;
        let capture_result = capture_task.await;

        let capture_stats = match capture_result {
            Ok((mut camera, stats)) => {
                release_camera(camera.as_mut()).await;
                Some(stats)
            }
            Err(e) => {
                error!("Capture task failed: {}", e);
                None
            }
        };

        let navigation = nav_result??;
        let vision_stats = vision_result?;
        let capture_stats = capture_stats
            .ok_or_else(|| SessionError::Task("capture task did not complete".to_string()))?;

        let report = SessionReport {
            ended_by,
            elapsed: started.elapsed(),
            frames_captured: capture_stats.frames_captured,
            capture_failures: capture_stats.capture_failures,
            frames_evicted: queue.evicted_count(),
            frames_processed: vision_stats.frames_processed,
            frames_discarded: vision_stats.frames_discarded,
            detections: vision_stats.detections,
            navigation,
        };
        info!(
            "Session finished after {:.1}s ({} frames captured, {} navigation cycles)",
            report.elapsed.as_secs_f64(),
            report.frames_captured,
            report.navigation.cycles
        );
        Ok(report)
    }
}

async fn release_camera(camera: &mut dyn FrameSource) {
    if let Err(e) = camera.release().await {
        warn!("Camera release failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimulatedCamera, SimulatedDrive, SimulatedRangeArray};
    use std::sync::atomic::Ordering;

    fn params(secs: u64) -> Parameters {
        let mut params = Parameters::default();
        params.session.run_duration_secs = secs;
        params
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut params = params(1);
        params.session.queue_capacity = 0;
        let hardware = Hardware {
            camera: Box::new(SimulatedCamera::new(320, 240)),
            sensors: Box::new(SimulatedRangeArray::clear(1000.0)),
            actuator: Box::new(SimulatedDrive::new()),
        };
        assert!(matches!(
            Orchestrator::new(params, hardware),
            Err(SessionError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_session_stops_drive_and_releases_camera() {
        let camera = SimulatedCamera::new(320, 240);
        let released = camera.release_flag();
        let drive = SimulatedDrive::new();
        let log = drive.log();
        let hardware = Hardware {
            camera: Box::new(camera),
            sensors: Box::new(SimulatedRangeArray::clear(1000.0)),
            actuator: Box::new(drive),
        };

        let report = Orchestrator::new(params(2), hardware).unwrap().run().await.unwrap();

        assert_eq!(report.ended_by, SessionEnd::DurationElapsed);
        assert_eq!(log.last(), Some(MotionCommand::Stop));
        assert_eq!(log.count(MotionCommand::Stop), 1);
        assert!(released.load(Ordering::SeqCst));
        assert!(report.frames_captured > 0);
    }

    /// Panics on any motion command other than stop
    struct PanickingDrive {
        commands: Arc<parking_lot::Mutex<Vec<MotionCommand>>>,
    }

    #[async_trait]
    impl MotionActuator for PanickingDrive {
        async fn command(&mut self, command: MotionCommand) -> Result<(), HardwareError> {
            if !command.is_stop() {
                panic!("driver crashed on {}", command);
            }
            self.commands.lock().push(command);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_panic_still_stops_drive() {
        let commands = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let camera = SimulatedCamera::new(320, 240);
        let released = camera.release_flag();
        let hardware = Hardware {
            camera: Box::new(camera),
            sensors: Box::new(SimulatedRangeArray::clear(1000.0)),
            actuator: Box::new(PanickingDrive {
                commands: commands.clone(),
            }),
        };

        let err = Orchestrator::new(params(30), hardware)
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Task(_)));
        assert_eq!(*commands.lock(), vec![MotionCommand::Stop]);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_initialization_attempts_stop() {
        let drive = SimulatedDrive::new().failing_initialize();
        let log = drive.log();
        let camera = SimulatedCamera::new(320, 240);
        let released = camera.release_flag();
        let hardware = Hardware {
            camera: Box::new(camera),
            sensors: Box::new(SimulatedRangeArray::clear(1000.0)),
            actuator: Box::new(drive),
        };

        let err = Orchestrator::new(params(30), hardware).unwrap().run().await.unwrap_err();

        assert!(matches!(err, SessionError::ActuatorInit(_)));
        assert_eq!(log.commands(), vec![MotionCommand::Stop]);
        assert!(released.load(Ordering::SeqCst));
    }
}
