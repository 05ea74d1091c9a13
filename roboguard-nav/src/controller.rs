//! Navigation control loop
//!
//! Each cycle reads the three range sensors, snapshots the detection state,
//! picks one manoeuvre from the policy and executes its command sequence.
//! Settle delays race against the stop signal, and whatever happens the
//! loop ends by sending exactly one `Stop` to the drive.

use crate::error::NavError;
use crate::policy::{DecisionPolicy, Maneuver, Step};
use roboguard_core::{
    DistanceSensorArray, MotionActuator, MotionCommand, NavigationParameters, StopSignal,
};
use roboguard_eye::SharedDetection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Result of one decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The full command sequence ran
    Executed(Maneuver),
    /// Stop was requested part way through the sequence
    Interrupted(Maneuver),
    /// Sensors unavailable or reading invalid; nothing was commanded
    Skipped,
}

/// What the controller did over a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationSummary {
    pub cycles: u64,
    pub skipped_cycles: u64,
    pub maneuvers: BTreeMap<Maneuver, u64>,
}

impl NavigationSummary {
    pub fn count(&self, maneuver: Maneuver) -> u64 {
        self.maneuvers.get(&maneuver).copied().unwrap_or(0)
    }
}

pub struct NavigationController {
    sensors: Box<dyn DistanceSensorArray>,
    actuator: Box<dyn MotionActuator>,
    detection: SharedDetection,
    policy: DecisionPolicy,
    params: NavigationParameters,
}

impl NavigationController {
    /// Controller with the standard obstacle-first policy
    pub fn new(
        sensors: Box<dyn DistanceSensorArray>,
        actuator: Box<dyn MotionActuator>,
        detection: SharedDetection,
        params: NavigationParameters,
    ) -> Self {
        let policy = DecisionPolicy::standard(params.safe_distance);
        Self::with_policy(sensors, actuator, detection, params, policy)
    }

    pub fn with_policy(
        sensors: Box<dyn DistanceSensorArray>,
        actuator: Box<dyn MotionActuator>,
        detection: SharedDetection,
        params: NavigationParameters,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            sensors,
            actuator,
            detection,
            policy,
            params,
        }
    }

    /// Run one sense-decide-act cycle.
    ///
    /// Actuator errors are returned as-is; the caller decides whether to
    /// attempt a stop.
    pub async fn cycle(&mut self, stop: &mut StopSignal) -> Result<CycleOutcome, NavError> {
        let reading = match self.sensors.read().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Range sensor read failed: {}", e);
                return Ok(CycleOutcome::Skipped);
            }
        };

        let clearance = match reading.validate() {
            Some(clearance) => clearance,
            None => {
                warn!("Invalid range reading {:?}, skipping cycle", reading);
                return Ok(CycleOutcome::Skipped);
            }
        };

        let detection = self.detection.snapshot();
        let maneuver = self.policy.decide(&clearance, &detection);
        info!("{}", maneuver.describe());
        debug!(
            "Clearance L={:.1} R={:.1} C={:.1}, object_detected={}",
            clearance.left, clearance.right, clearance.center, detection.object_detected
        );

        for step in maneuver.plan(&self.params) {
            match step {
                Step::Command(command) => {
                    if stop.is_stopped() {
                        return Ok(CycleOutcome::Interrupted(maneuver));
                    }
                    self.send(command).await?;
                }
                Step::Settle(duration) => {
                    if stop.sleep(duration).await {
                        return Ok(CycleOutcome::Interrupted(maneuver));
                    }
                }
            }
        }

        Ok(CycleOutcome::Executed(maneuver))
    }

    async fn send(&mut self, command: MotionCommand) -> Result<(), NavError> {
        debug!("Drive command: {}", command);
        self.actuator.command(command).await.map_err(NavError::Actuator)
    }

    /// Cycle until stopped, then halt the drive
    pub async fn run(mut self, mut stop: StopSignal) -> Result<NavigationSummary, NavError> {
        let mut summary = NavigationSummary::default();
        info!("Navigation controller started (safe distance {})", self.params.safe_distance);

        let outcome = loop {
            if stop.is_stopped() {
                break Ok(());
            }

            match self.cycle(&mut stop).await {
                Ok(CycleOutcome::Executed(maneuver)) => {
                    summary.cycles += 1;
                    *summary.maneuvers.entry(maneuver).or_insert(0) += 1;
                }
                Ok(CycleOutcome::Interrupted(maneuver)) => {
                    summary.cycles += 1;
                    *summary.maneuvers.entry(maneuver).or_insert(0) += 1;
                    debug!("{:?} interrupted by stop request", maneuver);
                    break Ok(());
                }
                Ok(CycleOutcome::Skipped) => {
                    summary.skipped_cycles += 1;
                    if stop.sleep(self.params.sensor_retry()).await {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            }
        };

        if let Err(e) = outcome {
            error!("Drive fault: {}, attempting to stop", e);
            if let Err(stop_err) = self.actuator.command(MotionCommand::Stop).await {
                error!("Failed to stop drive after fault: {}", stop_err);
            }
            return Err(e);
        }

        self.send(MotionCommand::Stop).await?;
        info!(
            "Navigation controller stopped ({} cycles, {} skipped)",
            summary.cycles, summary.skipped_cycles
        );
        Ok(summary)
    }
}
