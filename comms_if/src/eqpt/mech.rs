//! # Mechanisms Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// All joints of the arm, in the order demands are issued for a full-arm command.
pub const ARM_JOINT_IDS: [JointId; 5] = [
    JointId::Base,
    JointId::Shoulder,
    JointId::Elbow,
    JointId::Wrist,
    JointId::Gripper,
];

/// The rotational joints of the arm (everything but the gripper).
pub const ROT_JOINT_IDS: [JointId; 4] = [
    JointId::Base,
    JointId::Shoulder,
    JointId::Elbow,
    JointId::Wrist,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A demand for a single actuator, produced by arm control and consumed by an actuator sink.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorDem {
    /// The joint the demand is for.
    pub joint: JointId,

    /// The physical position the actuator shall move towards.
    ///
    /// Units: degrees, always within the actuator's native range [0, 180].
    pub pos_deg: u8,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators on the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    Wrist,
    Gripper,
}

/// State of the gripper. The gripper has no intermediate positions.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum GripperState {
    Open,
    Closed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// Lowercase name of the joint, as used in target requests.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::Base => "base",
            JointId::Shoulder => "shoulder",
            JointId::Elbow => "elbow",
            JointId::Wrist => "wrist",
            JointId::Gripper => "gripper",
        }
    }

    /// Find a joint from its lowercase name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        ARM_JOINT_IDS
            .iter()
            .copied()
            .find(|j| j.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GripperState {
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            GripperState::Open => GripperState::Closed,
            GripperState::Closed => GripperState::Open,
        }
    }

    /// Parse an `open`/`closed` label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("open") {
            Some(GripperState::Open)
        } else if label.eq_ignore_ascii_case("closed") {
            Some(GripperState::Closed)
        } else {
            None
        }
    }
}

impl Default for GripperState {
    fn default() -> Self {
        GripperState::Open
    }
}

impl fmt::Display for GripperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GripperState::Open => f.write_str("Open"),
            GripperState::Closed => f.write_str("Closed"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_names() {
        for id in ARM_JOINT_IDS.iter() {
            assert_eq!(JointId::from_name(id.name()), Some(*id));
        }
        assert_eq!(JointId::from_name("BASE"), Some(JointId::Base));
        assert_eq!(JointId::from_name("waist"), None);
    }

    #[test]
    fn test_gripper_toggle() {
        assert_eq!(GripperState::Open.toggled(), GripperState::Closed);
        assert_eq!(GripperState::Open.toggled().toggled(), GripperState::Open);
        assert_eq!(GripperState::from_label("Closed"), Some(GripperState::Closed));
        assert_eq!(GripperState::from_label("ajar"), None);
    }
}
