//! Gamepad teleoperation, teach, and replay for a UFACTORY xArm.
//!
//! Three operator workflows share one arm and one gamepad:
//!
//! - **Manual** — jog the arm from the sticks, either by discrete
//!   position steps or by continuous cartesian velocity.
//! - **Teach** — jog to a series of poses and record them as a named
//!   waypoint sequence in a CSV table.
//! - **Goto** — replay a taught sequence forward, actuate the gripper,
//!   and come back out along the reverse of the same sequence.
//!
//! The binary lives in `src/bin/teleop.rs`; everything below it is
//! testable without hardware through the [`arm::ArmCommander`] and
//! [`gamepad::InputSource`] seams.

pub mod arm;
pub mod config;
pub mod console;
pub mod control_loop;
pub mod gamepad;
pub mod jog;
pub mod pose;
pub mod waypoints;
pub mod workflow;

pub use arm::{ArmCommander, ArmSession, ControlMode};
pub use config::Config;
pub use pose::Pose;

/// Errors surfaced by the teleop library.
///
/// There is deliberately no retry or recovery layer: an arm or
/// transport fault aborts whichever workflow was active and propagates
/// to the binary.
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("no gamepad detected; connect a controller and try again")]
    NoGamepad,

    #[error("gamepad subsystem failed: {0}")]
    Gamepad(String),

    #[error("waypoint cell (column {column:?}, row {row}) is not a pose literal: {reason}")]
    MalformedWaypoint {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("sequence {0:?} already exists in the waypoint file with different poses")]
    DuplicateSequence(String),

    #[error("no sequence named {0:?} in the waypoint file")]
    UnknownSequence(String),

    #[error("arm fault: {0}")]
    Arm(String),

    #[error("control loop worker vanished without reporting back")]
    WorkerLost,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("waypoint file error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TeleopError>;
