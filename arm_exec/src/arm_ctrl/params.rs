//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ArmCtrlError, JointKind, PHYS_MAX_DEG, PHYS_MIN_DEG};
use comms_if::eqpt::mech::JointId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Change in angle for each directional command.
    ///
    /// Units: degrees
    pub step_deg: i32,

    /// Angle all rotational joints start at and return to on emergency stop.
    ///
    /// Units: degrees
    pub neutral_deg: i32,

    // ---- JOINTS ----
    pub base: JointParams,
    pub shoulder: JointParams,
    pub elbow: JointParams,
    pub wrist: JointParams,
}

/// Limits and representation of a single rotational joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointParams {
    pub kind: JointKind,

    /// Lowest logical angle
    ///
    /// Units: degrees
    pub min_deg: i32,

    /// Highest logical angle
    ///
    /// Units: degrees
    pub max_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        let bidir = JointParams {
            kind: JointKind::Bidirectional,
            min_deg: -180,
            max_deg: 180,
        };
        let unidir = JointParams {
            kind: JointKind::Unidirectional,
            min_deg: 0,
            max_deg: 170,
        };

        Self {
            step_deg: 5,
            neutral_deg: 90,
            base: bidir,
            shoulder: unidir,
            elbow: unidir,
            wrist: bidir,
        }
    }
}

impl Params {
    /// Get the parameters of a rotational joint, or `None` for the gripper.
    pub fn joint(&self, id: JointId) -> Option<&JointParams> {
        match id {
            JointId::Base => Some(&self.base),
            JointId::Shoulder => Some(&self.shoulder),
            JointId::Elbow => Some(&self.elbow),
            JointId::Wrist => Some(&self.wrist),
            JointId::Gripper => None,
        }
    }

    /// Check that the parameters cannot produce an angle outside the joint invariants.
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        if self.step_deg <= 0 || self.step_deg > PHYS_MAX_DEG {
            return Err(ArmCtrlError::InvalidParams(format!(
                "step_deg must be within (0, {}], found {}",
                PHYS_MAX_DEG, self.step_deg
            )));
        }

        for (id, p) in [
            (JointId::Base, &self.base),
            (JointId::Shoulder, &self.shoulder),
            (JointId::Elbow, &self.elbow),
            (JointId::Wrist, &self.wrist),
        ] {
            // Bidirectional joints are limited to a full turn either side of zero, unidirectional
            // joints to the physical range.
            let (lo, hi) = match p.kind {
                JointKind::Bidirectional => (-PHYS_MAX_DEG, PHYS_MAX_DEG),
                JointKind::Unidirectional => (PHYS_MIN_DEG, PHYS_MAX_DEG),
            };

            if p.min_deg > p.max_deg || p.min_deg < lo || p.max_deg > hi {
                return Err(ArmCtrlError::InvalidParams(format!(
                    "{} limits [{}, {}] must be ordered and within [{}, {}]",
                    id, p.min_deg, p.max_deg, lo, hi
                )));
            }

            if self.neutral_deg < p.min_deg || self.neutral_deg > p.max_deg {
                return Err(ArmCtrlError::InvalidParams(format!(
                    "neutral angle {} is outside the {} limits [{}, {}]",
                    self.neutral_deg, id, p.min_deg, p.max_deg
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_params_from_toml() {
        let params: Params = util::params::parse(
            r#"
            step_deg = 5
            neutral_deg = 90

            [base]
            kind = "Bidirectional"
            min_deg = -180
            max_deg = 180

            [shoulder]
            kind = "Unidirectional"
            min_deg = 0
            max_deg = 170

            [elbow]
            kind = "Unidirectional"
            min_deg = 0
            max_deg = 170

            [wrist]
            kind = "Bidirectional"
            min_deg = -180
            max_deg = 180
            "#,
        )
        .unwrap();

        assert_eq!(params, Params::default());
    }

    #[test]
    fn test_invalid_params() {
        let mut p = Params::default();
        p.step_deg = 0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.shoulder.min_deg = -10;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.base.max_deg = 190;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.elbow.max_deg = 80;
        assert!(matches!(p.validate(), Err(ArmCtrlError::InvalidParams(_))));
    }
}
