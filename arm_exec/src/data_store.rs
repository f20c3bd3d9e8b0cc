//! # Data Store

use comms_if::tm::{ArmTm, SystemStatus};
use log::{info, warn};

use crate::arm_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // ArmCtrl
    pub arm_ctrl: arm_ctrl::ArmCtrl,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    /// Number of commands applied to arm control
    pub num_cmds: u64,

    // Monitoring Counters
    /// Number of consecutive actuator sink write errors
    pub num_consec_sink_errors: u64,

    /// Number of consecutive sink errors after which the arm is reported as in error. Zero
    /// means any sink error.
    pub max_sink_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(arm_ctrl: arm_ctrl::ArmCtrl, max_sink_errors: u64) -> Self {
        Self {
            arm_ctrl,
            max_sink_errors,
            ..Default::default()
        }
    }

    /// Record the outcome of a sink write.
    pub fn sink_result(&mut self, ok: bool) {
        if ok {
            if self.num_consec_sink_errors > 0 {
                info!(
                    "Actuator sink recovered after {} consecutive errors",
                    self.num_consec_sink_errors
                );
            }
            self.num_consec_sink_errors = 0;
        } else {
            self.num_consec_sink_errors += 1;

            if self.num_consec_sink_errors == self.max_sink_errors + 1 {
                warn!(
                    "{} consecutive actuator sink errors, arm status is now Error",
                    self.num_consec_sink_errors
                );
            }
        }
    }

    pub fn system_status(&self) -> SystemStatus {
        if self.num_consec_sink_errors > self.max_sink_errors {
            SystemStatus::Error
        } else {
            SystemStatus::Operational
        }
    }

    /// Build a telemetry packet from the current arm pose.
    pub fn telemetry(&self) -> ArmTm {
        let pose = self.arm_ctrl.snapshot();

        ArmTm {
            base_angle: pose.base_deg,
            shoulder_angle: pose.shoulder_deg,
            elbow_angle: pose.elbow_deg,
            wrist_angle: pose.wrist_deg,
            gripper_state: pose.gripper,
            system_status: self.system_status(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::mech::GripperState;

    #[test]
    fn test_status_tracks_sink_errors() {
        let mut ds = DataStore::new(arm_ctrl::ArmCtrl::default(), 2);

        ds.sink_result(false);
        ds.sink_result(false);
        assert_eq!(ds.system_status(), SystemStatus::Operational);

        ds.sink_result(false);
        assert_eq!(ds.system_status(), SystemStatus::Error);

        ds.sink_result(true);
        assert_eq!(ds.system_status(), SystemStatus::Operational);
    }

    #[test]
    fn test_telemetry() {
        let ds = DataStore::default();
        let tm = ds.telemetry();

        assert_eq!(tm.base_angle, 90);
        assert_eq!(tm.wrist_angle, 90);
        assert_eq!(tm.gripper_state, GripperState::Open);
        assert_eq!(tm.system_status, SystemStatus::Operational);
    }
}
