//! Prioritised decision rules
//!
//! The policy is a flat, ordered list of predicate/manoeuvre pairs. The first
//! rule whose predicate holds wins; later rules are not consulted. Proximity
//! rules come before the vision rule because the range sensors are the
//! authoritative collision signal.

use roboguard_core::{Clearance, MotionCommand, NavigationParameters};
use roboguard_eye::DetectionState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the robot does for one decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Maneuver {
    /// Obstacle ahead: turn right, then continue forward
    AvoidCenter,
    /// Obstacle on the left: turn right, then continue forward
    AvoidLeft,
    /// Obstacle on the right: turn left, then continue forward
    AvoidRight,
    /// Target seen: move forward briefly, then turn right to circle it
    CircleObject,
    /// Nothing in the way
    Cruise,
}

/// One element of a manoeuvre's command sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Command(MotionCommand),
    /// Wait for the previous command to physically complete
    Settle(Duration),
}

impl Maneuver {
    pub fn describe(&self) -> &'static str {
        match self {
            Maneuver::AvoidCenter => "Obstacle ahead! Turning right.",
            Maneuver::AvoidLeft => "Obstacle on the left! Turning right.",
            Maneuver::AvoidRight => "Obstacle on the right! Turning left.",
            Maneuver::CircleObject => "Detected object! Moving around it.",
            Maneuver::Cruise => "Moving forward.",
        }
    }

    /// Command sequence, with settle delays, for this manoeuvre
    pub fn plan(&self, params: &NavigationParameters) -> Vec<Step> {
        let degrees = params.turn_degrees;
        match self {
            Maneuver::AvoidCenter | Maneuver::AvoidLeft => vec![
                Step::Command(MotionCommand::turn_right(degrees)),
                Step::Settle(params.turn_settle()),
                Step::Command(MotionCommand::Forward),
                Step::Settle(params.forward_settle()),
            ],
            Maneuver::AvoidRight => vec![
                Step::Command(MotionCommand::turn_left(degrees)),
                Step::Settle(params.turn_settle()),
                Step::Command(MotionCommand::Forward),
                Step::Settle(params.forward_settle()),
            ],
            Maneuver::CircleObject => vec![
                Step::Command(MotionCommand::Forward),
                Step::Settle(params.circle_forward()),
                Step::Command(MotionCommand::turn_right(degrees)),
                Step::Settle(params.circle_turn_settle()),
            ],
            Maneuver::Cruise => vec![
                Step::Command(MotionCommand::Forward),
                Step::Settle(params.forward_settle()),
            ],
        }
    }
}

type Predicate = fn(&Clearance, &DetectionState, f64) -> bool;

/// A named predicate paired with the manoeuvre it selects
#[derive(Clone)]
pub struct DecisionRule {
    pub name: &'static str,
    pub maneuver: Maneuver,
    predicate: Predicate,
}

impl DecisionRule {
    pub fn new(name: &'static str, maneuver: Maneuver, predicate: Predicate) -> Self {
        Self {
            name,
            maneuver,
            predicate,
        }
    }

    pub fn applies(
        &self,
        clearance: &Clearance,
        detection: &DetectionState,
        safe_distance: f64,
    ) -> bool {
        (self.predicate)(clearance, detection, safe_distance)
    }
}

impl std::fmt::Debug for DecisionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionRule")
            .field("name", &self.name)
            .field("maneuver", &self.maneuver)
            .finish()
    }
}

/// Ordered first-match policy
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    rules: Vec<DecisionRule>,
    safe_distance: f64,
}

impl DecisionPolicy {
    /// Center obstacle, left obstacle, right obstacle, detected object, cruise
    pub fn standard(safe_distance: f64) -> Self {
        Self::with_rules(
            vec![
                DecisionRule::new("center_obstacle", Maneuver::AvoidCenter, |c, _, safe| {
                    c.center < safe
                }),
                DecisionRule::new("left_obstacle", Maneuver::AvoidLeft, |c, _, safe| {
                    c.left < safe
                }),
                DecisionRule::new("right_obstacle", Maneuver::AvoidRight, |c, _, safe| {
                    c.right < safe
                }),
                DecisionRule::new("object_detected", Maneuver::CircleObject, |_, d, _| {
                    d.object_detected
                }),
                DecisionRule::new("clear", Maneuver::Cruise, |_, _, _| true),
            ],
            safe_distance,
        )
    }

    pub fn with_rules(rules: Vec<DecisionRule>, safe_distance: f64) -> Self {
        Self {
            rules,
            safe_distance,
        }
    }

    pub fn rules(&self) -> &[DecisionRule] {
        &self.rules
    }

    /// First matching rule's manoeuvre; cruise if none match
    pub fn decide(&self, clearance: &Clearance, detection: &DetectionState) -> Maneuver {
        self.rules
            .iter()
            .find(|rule| rule.applies(clearance, detection, self.safe_distance))
            .map(|rule| rule.maneuver)
            .unwrap_or(Maneuver::Cruise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAFE: f64 = 200.0;

    fn clearance(left: f64, right: f64, center: f64) -> Clearance {
        Clearance {
            left,
            right,
            center,
        }
    }

    fn detection(object_detected: bool) -> DetectionState {
        DetectionState {
            object_detected,
            estimated_distance: 50.0,
            frame_sequence: Some(1),
        }
    }

    #[test]
    fn test_rule_order() {
        let policy = DecisionPolicy::standard(SAFE);
        let names: Vec<_> = policy.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["center_obstacle", "left_obstacle", "right_obstacle", "object_detected", "clear"]
        );
    }

    #[test]
    fn test_center_obstacle_beats_detected_object() {
        let policy = DecisionPolicy::standard(SAFE);
        let m = policy.decide(&clearance(1000.0, 1000.0, 50.0), &detection(true));
        assert_eq!(m, Maneuver::AvoidCenter);
    }

    #[test]
    fn test_center_beats_sides() {
        let policy = DecisionPolicy::standard(SAFE);
        let m = policy.decide(&clearance(10.0, 10.0, 10.0), &detection(false));
        assert_eq!(m, Maneuver::AvoidCenter);
    }

    #[test]
    fn test_left_beats_right_and_object() {
        let policy = DecisionPolicy::standard(SAFE);
        let m = policy.decide(&clearance(100.0, 100.0, 1000.0), &detection(true));
        assert_eq!(m, Maneuver::AvoidLeft);
    }

    #[test]
    fn test_right_obstacle_beats_object() {
        let policy = DecisionPolicy::standard(SAFE);
        let m = policy.decide(&clearance(1000.0, 100.0, 1000.0), &detection(true));
        assert_eq!(m, Maneuver::AvoidRight);
    }

    #[test]
    fn test_object_and_clear() {
        let policy = DecisionPolicy::standard(SAFE);
        let open = clearance(1000.0, 1000.0, 1000.0);
        assert_eq!(policy.decide(&open, &detection(true)), Maneuver::CircleObject);
        assert_eq!(policy.decide(&open, &detection(false)), Maneuver::Cruise);
    }

    #[test]
    fn test_safe_distance_is_exclusive() {
        let policy = DecisionPolicy::standard(SAFE);
        let m = policy.decide(&clearance(SAFE, SAFE, SAFE), &detection(false));
        assert_eq!(m, Maneuver::Cruise);
    }

    #[test]
    fn test_empty_policy_cruises() {
        let policy = DecisionPolicy::with_rules(vec![], SAFE);
        let m = policy.decide(&clearance(1.0, 1.0, 1.0), &detection(true));
        assert_eq!(m, Maneuver::Cruise);
    }

    #[test]
    fn test_plans() {
        let params = NavigationParameters::default();
        assert_eq!(
            Maneuver::AvoidCenter.plan(&params),
            vec![
                Step::Command(MotionCommand::Turn { degrees: 90.0 }),
                Step::Settle(Duration::from_secs(1)),
                Step::Command(MotionCommand::Forward),
                Step::Settle(Duration::from_millis(500)),
            ]
        );
        assert_eq!(
            Maneuver::AvoidRight.plan(&params)[0],
            Step::Command(MotionCommand::Turn { degrees: -90.0 })
        );
        assert_eq!(
            Maneuver::CircleObject.plan(&params),
            vec![
                Step::Command(MotionCommand::Forward),
                Step::Settle(Duration::from_secs(1)),
                Step::Command(MotionCommand::Turn { degrees: 90.0 }),
                Step::Settle(Duration::from_secs(1)),
            ]
        );
        assert_eq!(
            Maneuver::Cruise.plan(&params),
            vec![
                Step::Command(MotionCommand::Forward),
                Step::Settle(Duration::from_millis(500)),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_center_obstacle_always_wins(
            left in 1.0f64..2000.0,
            right in 1.0f64..2000.0,
            center in 1.0f64..199.9,
            seen in any::<bool>(),
        ) {
            let policy = DecisionPolicy::standard(SAFE);
            let m = policy.decide(&clearance(left, right, center), &detection(seen));
            prop_assert_eq!(m, Maneuver::AvoidCenter);
        }

        #[test]
        fn prop_vision_only_acts_without_proximity_hazard(
            left in 1.0f64..2000.0,
            right in 1.0f64..2000.0,
            center in 1.0f64..2000.0,
        ) {
            let policy = DecisionPolicy::standard(SAFE);
            let m = policy.decide(&clearance(left, right, center), &detection(true));
            let hazard = left < SAFE || right < SAFE || center < SAFE;
            prop_assert_eq!(m == Maneuver::CircleObject, !hazard);
        }
    }
}
