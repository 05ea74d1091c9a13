//! roboguard-pilot: runs a roboguard session
//!
//! Owns the session lifecycle (start the three activities, bound them by the
//! run duration, tear them down in order) and the simulated hardware used
//! when no robot is attached.

pub mod error;
pub mod session;
pub mod sim;

pub use error::SessionError;
pub use session::{Hardware, Orchestrator, SessionEnd, SessionReport};
pub use sim::{DriveLog, ObstacleSide, SimulatedCamera, SimulatedDrive, SimulatedRangeArray};
