//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::TcParseError;
use crate::eqpt::mech::{GripperState, JointId};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The closed set of commands arm control understands.
///
/// Adding a command means extending this enum, its wire name in [`ArmCmd::name`], and the
/// transition table in arm control together. Strings that are not listed here never reach arm
/// control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmCmd {
    WaistLeft,
    WaistRight,
    ShoulderUp,
    ShoulderDown,
    ElbowUp,
    ElbowDown,
    WristLeft,
    WristRight,
    GripperToggle,

    /// Return every joint to neutral and open the gripper.
    EmergencyStop,
}

/// An absolute target, which is expanded by arm control into a sequence of [`ArmCmd`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointTarget {
    /// Move a rotational joint to the given logical angle.
    Angle {
        joint: JointId,

        /// Units: degrees
        deg: i32,
    },

    /// Put the gripper into the given state.
    Gripper(GripperState),

    EmergencyStop,
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

impl ArmCmd {
    /// Every command in the vocabulary.
    pub const ALL: [ArmCmd; 10] = [
        ArmCmd::WaistLeft,
        ArmCmd::WaistRight,
        ArmCmd::ShoulderUp,
        ArmCmd::ShoulderDown,
        ArmCmd::ElbowUp,
        ArmCmd::ElbowDown,
        ArmCmd::WristLeft,
        ArmCmd::WristRight,
        ArmCmd::GripperToggle,
        ArmCmd::EmergencyStop,
    ];
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmCmd {
    /// The wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            ArmCmd::WaistLeft => "WAIST_LEFT",
            ArmCmd::WaistRight => "WAIST_RIGHT",
            ArmCmd::ShoulderUp => "SHOULDER_UP",
            ArmCmd::ShoulderDown => "SHOULDER_DOWN",
            ArmCmd::ElbowUp => "ELBOW_UP",
            ArmCmd::ElbowDown => "ELBOW_DOWN",
            ArmCmd::WristLeft => "WRIST_LEFT",
            ArmCmd::WristRight => "WRIST_RIGHT",
            ArmCmd::GripperToggle => "GRIPPER_TOGGLE",
            ArmCmd::EmergencyStop => "EMERGENCY_STOP",
        }
    }
}

impl FromStr for ArmCmd {
    type Err = TcParseError;

    /// Match a wire name exactly. Names are case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArmCmd::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| TcParseError::InvalidCommand(s.to_string()))
    }
}

impl fmt::Display for ArmCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names_match_serde() {
        for cmd in ArmCmd::ALL.iter() {
            let json = serde_json::to_string(cmd).unwrap();
            assert_eq!(json, format!("\"{}\"", cmd.name()));
            assert_eq!(cmd.name().parse::<ArmCmd>().unwrap(), *cmd);
        }
    }

    #[test]
    fn test_unknown_rejected() {
        assert!(matches!(
            "WAIST_UP".parse::<ArmCmd>(),
            Err(TcParseError::InvalidCommand(s)) if s == "WAIST_UP"
        ));
        // Names are case sensitive
        assert!("waist_left".parse::<ArmCmd>().is_err());
        assert!("".parse::<ArmCmd>().is_err());
    }
}
