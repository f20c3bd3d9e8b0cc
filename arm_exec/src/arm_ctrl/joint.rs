//! Joint representation and logical-to-physical mapping

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{
    JointParams, BIDIR_OFFSET_DEG, GRIPPER_CLOSED_DEG, GRIPPER_OPEN_DEG, PHYS_MAX_DEG,
    PHYS_MIN_DEG,
};
use comms_if::eqpt::mech::{GripperState, JointId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single rotational joint of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joint {
    id: JointId,

    kind: JointKind,

    /// Current logical angle.
    ///
    /// Units: degrees
    angle_deg: i32,

    /// Inclusive logical limits.
    ///
    /// Units: degrees
    min_deg: i32,
    max_deg: i32,

    /// Change in angle per directional command.
    ///
    /// Units: degrees
    step_deg: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a joint's logical angle relates to its actuator's physical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointKind {
    /// Logical range is symmetric about zero, physical value is the angle offset by
    /// [`BIDIR_OFFSET_DEG`].
    Bidirectional,

    /// Logical range is the physical range, physical value is the angle itself.
    Unidirectional,
}

/// Direction of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Increase,
    Decrease,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointKind {
    /// Map a logical angle onto the physical range without bounding it.
    pub fn map(self, angle_deg: i32) -> i32 {
        match self {
            JointKind::Bidirectional => angle_deg.saturating_add(BIDIR_OFFSET_DEG),
            JointKind::Unidirectional => angle_deg,
        }
    }

    /// Map a logical angle onto the physical range.
    ///
    /// Returns the physical value and whether the physical safety clamp had to
    /// change it.
    pub fn to_physical(self, angle_deg: i32) -> (u8, bool) {
        let mapped = self.map(angle_deg);
        let bounded = mapped.clamp(PHYS_MIN_DEG, PHYS_MAX_DEG);

        (bounded as u8, bounded != mapped)
    }
}

impl Joint {
    /// Create a new joint at the given logical angle.
    pub fn new(id: JointId, params: &JointParams, step_deg: i32, angle_deg: i32) -> Self {
        Self {
            id,
            kind: params.kind,
            angle_deg,
            min_deg: params.min_deg,
            max_deg: params.max_deg,
            step_deg,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn angle_deg(&self) -> i32 {
        self.angle_deg
    }

    /// Inclusive logical limits as `(min, max)`.
    pub fn limits_deg(&self) -> (i32, i32) {
        (self.min_deg, self.max_deg)
    }

    pub fn step_deg(&self) -> i32 {
        self.step_deg
    }

    /// Physical value for the current angle, and whether the safety clamp engaged.
    pub fn physical(&self) -> (u8, bool) {
        self.kind.to_physical(self.angle_deg)
    }

    /// Move the joint by one step, saturating at the logical limits.
    ///
    /// Returns true if the logical limit was hit.
    pub(crate) fn step(&mut self, dir: Dir) -> bool {
        let candidate = match dir {
            Dir::Increase => self.angle_deg.saturating_add(self.step_deg),
            Dir::Decrease => self.angle_deg.saturating_sub(self.step_deg),
        };

        self.angle_deg = candidate.clamp(self.min_deg, self.max_deg);

        self.angle_deg != candidate
    }

    /// Set the joint to an angle within its limits.
    pub(crate) fn set(&mut self, angle_deg: i32) {
        self.angle_deg = angle_deg.clamp(self.min_deg, self.max_deg);
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Physical value of the gripper in the given state.
pub fn gripper_physical(state: GripperState) -> u8 {
    match state {
        GripperState::Open => GRIPPER_OPEN_DEG,
        GripperState::Closed => GRIPPER_CLOSED_DEG,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
