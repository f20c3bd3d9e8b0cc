//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

// Internal
use super::{gripper_physical, ArmCtrlError, Dir, Joint, Params, NUM_ROT_JOINTS};
use comms_if::{
    eqpt::mech::{ActuatorDem, GripperState, JointId},
    tc::arm_ctrl::ArmCmd,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const BASE: usize = 0;
const SHOULDER: usize = 1;
const ELBOW: usize = 2;
const WRIST: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
///
/// All joint angles are owned here and only change through [`ArmCtrl::apply`]
/// and [`ArmCtrl::emergency_stop`].
#[derive(Debug, Clone)]
pub struct ArmCtrl {
    params: Params,

    /// Rotational joints, indexed base, shoulder, elbow, wrist.
    joints: [Joint; NUM_ROT_JOINTS],

    gripper: GripperState,

    report: StatusReport,
}

/// An immutable snapshot of the arm's commanded pose.
///
/// All angles are logical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pose {
    pub base_deg: i32,
    pub shoulder_deg: i32,
    pub elbow_deg: i32,
    pub wrist_deg: i32,
    pub gripper: GripperState,
}

/// Status report for the last command processed by ArmCtrl.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// Set for each rotational joint whose logical angle was pinned to a limit.
    pub abs_pos_limited: [bool; NUM_ROT_JOINTS],

    /// Set for each rotational joint whose physical value was pinned to the actuator range.
    pub phys_limited: [bool; NUM_ROT_JOINTS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The state transition a command causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Step the rotational joint at the given index.
    Step { idx: usize, dir: Dir },
    ToggleGripper,
    EmergencyStop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmCtrl {
    fn default() -> Self {
        Self::build(Params::default())
    }
}

impl ArmCtrl {
    /// Create arm control from a set of parameters, with every joint at neutral and the gripper
    /// open.
    pub fn new(params: Params) -> Result<Self, ArmCtrlError> {
        params.validate()?;

        Ok(Self::build(params))
    }

    fn build(params: Params) -> Self {
        let step = params.step_deg;
        let neutral = params.neutral_deg;

        let joints = [
            Joint::new(JointId::Base, &params.base, step, neutral),
            Joint::new(JointId::Shoulder, &params.shoulder, step, neutral),
            Joint::new(JointId::Elbow, &params.elbow, step, neutral),
            Joint::new(JointId::Wrist, &params.wrist, step, neutral),
        ];

        Self {
            params,
            joints,
            gripper: GripperState::Open,
            report: StatusReport::default(),
        }
    }

    /// Apply a single command.
    ///
    /// Returns the demands which must be forwarded to the actuator sink. This is a single demand
    /// for every command except [`ArmCmd::EmergencyStop`], which demands every actuator.
    pub fn apply(&mut self, cmd: ArmCmd) -> Vec<ActuatorDem> {
        debug!("Applying ArmCmd::{:?}", cmd);

        match transition(cmd) {
            Transition::Step { idx, dir } => {
                self.report = StatusReport::default();
                vec![self.step_joint(idx, dir)]
            }
            Transition::ToggleGripper => {
                self.report = StatusReport::default();
                self.gripper = self.gripper.toggled();
                debug!("Gripper now {}", self.gripper);
                vec![self.gripper_dem()]
            }
            Transition::EmergencyStop => self.emergency_stop(),
        }
    }

    /// Return every rotational joint to neutral and open the gripper.
    ///
    /// Returns demands for all actuators, in the order base, shoulder, elbow, wrist, gripper.
    pub fn emergency_stop(&mut self) -> Vec<ActuatorDem> {
        self.report = StatusReport::default();

        for joint in self.joints.iter_mut() {
            joint.set(self.params.neutral_deg);
        }
        self.gripper = GripperState::Open;

        info!("Emergency stop, all joints returned to neutral");

        self.dems()
    }

    /// Demands for all actuators based on the current state, in the order base, shoulder,
    /// elbow, wrist, gripper.
    pub fn dems(&self) -> Vec<ActuatorDem> {
        let mut dems: Vec<ActuatorDem> = self
            .joints
            .iter()
            .map(|j| ActuatorDem {
                joint: j.id(),
                pos_deg: j.physical().0,
            })
            .collect();

        dems.push(self.gripper_dem());

        dems
    }

    /// Get a snapshot of the current pose.
    pub fn snapshot(&self) -> Pose {
        Pose {
            base_deg: self.joints[BASE].angle_deg(),
            shoulder_deg: self.joints[SHOULDER].angle_deg(),
            elbow_deg: self.joints[ELBOW].angle_deg(),
            wrist_deg: self.joints[WRIST].angle_deg(),
            gripper: self.gripper,
        }
    }

    /// Status report for the last command.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Get a rotational joint, or `None` for the gripper.
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.iter().find(|j| j.id() == id)
    }

    pub fn gripper(&self) -> GripperState {
        self.gripper
    }

    /// Step one joint and build its demand.
    fn step_joint(&mut self, idx: usize, dir: Dir) -> ActuatorDem {
        let joint = &mut self.joints[idx];

        let limited = joint.step(dir);
        let (pos_deg, phys_limited) = joint.physical();

        if limited {
            debug!("{} limited at {} deg", joint.id(), joint.angle_deg());
        }
        trace!(
            "{} logical {} deg -> physical {} deg",
            joint.id(),
            joint.angle_deg(),
            pos_deg
        );

        self.report.abs_pos_limited[idx] = limited;
        self.report.phys_limited[idx] = phys_limited;

        ActuatorDem {
            joint: joint.id(),
            pos_deg,
        }
    }

    fn gripper_dem(&self) -> ActuatorDem {
        ActuatorDem {
            joint: JointId::Gripper,
            pos_deg: gripper_physical(self.gripper),
        }
    }
}

impl Pose {
    /// Logical angle of a rotational joint, or `None` for the gripper.
    pub fn angle_deg(&self, id: JointId) -> Option<i32> {
        match id {
            JointId::Base => Some(self.base_deg),
            JointId::Shoulder => Some(self.shoulder_deg),
            JointId::Elbow => Some(self.elbow_deg),
            JointId::Wrist => Some(self.wrist_deg),
            JointId::Gripper => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The transition table: every command maps to exactly one transition.
pub(crate) fn transition(cmd: ArmCmd) -> Transition {
    use Dir::*;

    match cmd {
        ArmCmd::WaistLeft => Transition::Step { idx: BASE, dir: Decrease },
        ArmCmd::WaistRight => Transition::Step { idx: BASE, dir: Increase },
        ArmCmd::ShoulderUp => Transition::Step { idx: SHOULDER, dir: Increase },
        ArmCmd::ShoulderDown => Transition::Step { idx: SHOULDER, dir: Decrease },
        ArmCmd::ElbowUp => Transition::Step { idx: ELBOW, dir: Increase },
        ArmCmd::ElbowDown => Transition::Step { idx: ELBOW, dir: Decrease },
        ArmCmd::WristLeft => Transition::Step { idx: WRIST, dir: Decrease },
        ArmCmd::WristRight => Transition::Step { idx: WRIST, dir: Increase },
        ArmCmd::GripperToggle => Transition::ToggleGripper,
        ArmCmd::EmergencyStop => Transition::EmergencyStop,
    }
}

/// The command which steps `joint` in `dir`, or `None` for the gripper.
pub(crate) fn step_cmd(joint: JointId, dir: Dir) -> Option<ArmCmd> {
    use Dir::*;

    Some(match (joint, dir) {
        (JointId::Base, Decrease) => ArmCmd::WaistLeft,
        (JointId::Base, Increase) => ArmCmd::WaistRight,
        (JointId::Shoulder, Increase) => ArmCmd::ShoulderUp,
        (JointId::Shoulder, Decrease) => ArmCmd::ShoulderDown,
        (JointId::Elbow, Increase) => ArmCmd::ElbowUp,
        (JointId::Elbow, Decrease) => ArmCmd::ElbowDown,
        (JointId::Wrist, Decrease) => ArmCmd::WristLeft,
        (JointId::Wrist, Increase) => ArmCmd::WristRight,
        (JointId::Gripper, _) => return None,
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
