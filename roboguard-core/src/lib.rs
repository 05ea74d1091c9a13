//! roboguard-core: shared vocabulary for the roboguard robot
//!
//! Frames, range readings and motion commands exchanged between the capture,
//! vision and navigation activities, the fixed parameter set, and the
//! contracts of the hardware the core talks to.

pub mod config;
pub mod error;
pub mod hardware;
pub mod signal;
pub mod types;

pub use config::{NavigationParameters, Parameters, SessionParameters, VisionParameters};
pub use error::{Error, HardwareError, Result};
pub use hardware::{DistanceSensorArray, FrameSource, MotionActuator};
pub use signal::{stop_channel, StopSignal, StopTrigger};
pub use types::{Clearance, Frame, MotionCommand, Rgb, SensorReading};
