//! roboguard-nav: obstacle avoidance for the roboguard robot
//!
//! Combines the range sensors with the latest vision result through a fixed
//! priority policy and drives the motors one manoeuvre at a time.

pub mod controller;
pub mod error;
pub mod policy;

pub use controller::{CycleOutcome, NavigationController, NavigationSummary};
pub use error::NavError;
pub use policy::{DecisionPolicy, DecisionRule, Maneuver, Step};
