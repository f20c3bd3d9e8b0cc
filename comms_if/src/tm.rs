//! # Arm telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::mech::GripperState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry packet describing the arm's commanded pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmTm {
    /// Logical base angle in degrees
    pub base_angle: i32,

    /// Logical shoulder angle in degrees
    pub shoulder_angle: i32,

    /// Logical elbow angle in degrees
    pub elbow_angle: i32,

    /// Logical wrist angle in degrees
    pub wrist_angle: i32,

    pub gripper_state: GripperState,

    /// Health of the link to the actuators. This is not derived from arm control.
    pub system_status: SystemStatus,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    Operational,
    Error,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tm_field_names() {
        let tm = ArmTm {
            base_angle: -180,
            shoulder_angle: 170,
            elbow_angle: 0,
            wrist_angle: 90,
            gripper_state: GripperState::Closed,
            system_status: SystemStatus::Operational,
        };

        let val = serde_json::to_value(&tm).unwrap();

        assert_eq!(val["baseAngle"], -180);
        assert_eq!(val["shoulderAngle"], 170);
        assert_eq!(val["elbowAngle"], 0);
        assert_eq!(val["wristAngle"], 90);
        assert_eq!(val["gripperState"], "Closed");
        assert_eq!(val["systemStatus"], "Operational");
    }
}
