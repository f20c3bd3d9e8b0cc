//! Arm control module
//!
//! Arm control is the single authority over the arm's joint targets. Commands
//! from the closed [`ArmCmd`](comms_if::tc::arm_ctrl::ArmCmd) vocabulary are
//! turned into saturated joint angles, which are then mapped onto the
//! actuators' physical range and returned as demands for an actuator sink.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod joint;
mod params;
mod state;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use joint::*;
pub use params::*;
pub use state::*;

use comms_if::eqpt::mech::JointId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of rotational joints on the arm.
pub const NUM_ROT_JOINTS: usize = 4;

/// Lowest physical value accepted by the actuators.
///
/// Units: degrees
pub const PHYS_MIN_DEG: i32 = 0;

/// Highest physical value accepted by the actuators.
///
/// Units: degrees
pub const PHYS_MAX_DEG: i32 = 180;

/// Offset added to a bidirectional joint's logical angle to get its physical value.
///
/// Units: degrees
pub const BIDIR_OFFSET_DEG: i32 = 90;

/// Physical value of the gripper when open.
pub const GRIPPER_OPEN_DEG: u8 = 180;

/// Physical value of the gripper when closed.
pub const GRIPPER_CLOSED_DEG: u8 = 0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Invalid arm control parameters: {0}")]
    InvalidParams(String),

    #[error("Angle out of range ({min} to {max})")]
    AngleOutOfRange {
        joint: JointId,
        deg: i32,
        min: i32,
        max: i32,
    },

    #[error("The {0} joint cannot be moved to an angle")]
    NotRotational(JointId),
}
