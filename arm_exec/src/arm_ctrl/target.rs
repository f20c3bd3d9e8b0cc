//! Absolute joint targets
//!
//! A target names where a joint should end up rather than which way it should move. Targets are
//! expanded into repeated single-step commands so that every motion still goes through
//! [`ArmCtrl::apply`] and its limits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::{state::step_cmd, ArmCtrl, ArmCtrlError, Dir};
use comms_if::tc::arm_ctrl::{ArmCmd, JointTarget};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Expand a target into the commands which move the arm towards it.
    ///
    /// Angle targets step by whole increments only, so a target which is not a multiple of the
    /// step away from the current angle stops short of it. An already reached target gives an
    /// empty plan.
    pub fn plan_target(&self, target: &JointTarget) -> Result<Vec<ArmCmd>, ArmCtrlError> {
        let plan = match *target {
            JointTarget::Angle { joint, deg } => {
                let j = self
                    .joint(joint)
                    .ok_or(ArmCtrlError::NotRotational(joint))?;

                let (min, max) = j.limits_deg();
                if deg < min || deg > max {
                    return Err(ArmCtrlError::AngleOutOfRange {
                        joint,
                        deg,
                        min,
                        max,
                    });
                }

                let diff = deg - j.angle_deg();
                let dir = if diff >= 0 { Dir::Increase } else { Dir::Decrease };
                let num_steps = (diff.abs() / j.step_deg()) as usize;

                match step_cmd(joint, dir) {
                    Some(cmd) => vec![cmd; num_steps],
                    None => return Err(ArmCtrlError::NotRotational(joint)),
                }
            }
            JointTarget::Gripper(state) => {
                if state != self.gripper() {
                    vec![ArmCmd::GripperToggle]
                } else {
                    vec![]
                }
            }
            JointTarget::EmergencyStop => vec![ArmCmd::EmergencyStop],
        };

        debug!("Target {:?} planned as {} command(s)", target, plan.len());

        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
