//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. A telecommand arrives as a JSON object, either naming a command
//! from the arm's vocabulary (`{"command": "WAIST_LEFT"}`) or naming an
//! absolute target for one joint (`{"joint": "base", "value": 45}`).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use crate::eqpt::mech::{GripperState, JointId};
use arm_ctrl::{ArmCmd, JointTarget};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tc {
    /// A single command from the arm's vocabulary.
    Arm(ArmCmd),

    /// An absolute target to be expanded into commands.
    Target(JointTarget),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC does not contain a command")]
    NoCommand,

    #[error("\"{0}\" is not a recognised command")]
    InvalidCommand(String),

    #[error("{0}")]
    InvalidTarget(String),
}

/// The response to a telecommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcResponse {
    /// The command was accepted and its demands forwarded.
    Executing,

    /// An emergency stop was executed.
    Stopped,

    /// The target was already reached, nothing was commanded.
    NoMotion,

    /// The TC was rejected before reaching arm control.
    Rejected(String),

    /// The command was applied but the actuator sink failed.
    ActuatorError(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        trace!("Parsing TC: {}", val);

        if let Some(cmd) = val.get("command") {
            return match cmd.as_str() {
                Some(s) => Ok(Tc::Arm(s.parse()?)),
                None => Err(TcParseError::InvalidCommand(cmd.to_string())),
            };
        }

        if let Some(joint) = val.get("joint") {
            return parse_target(joint, val.get("value").unwrap_or(&Value::Null)).map(Tc::Target);
        }

        Err(TcParseError::NoCommand)
    }
}

impl TcResponse {
    /// The status text reported back to the sender.
    pub fn status(&self) -> String {
        match self {
            TcResponse::Executing => String::from("Executing"),
            TcResponse::Stopped => String::from("Stopped"),
            TcResponse::NoMotion => String::from("No motion required"),
            TcResponse::Rejected(s) => s.clone(),
            TcResponse::ActuatorError(s) => format!("Actuator error: {}", s),
        }
    }

    /// Serialise the response as a `{"status": ...}` JSON object.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "status": self.status() }).to_string()
    }
}

impl From<&TcParseError> for TcResponse {
    fn from(e: &TcParseError) -> Self {
        TcResponse::Rejected(match e {
            TcParseError::InvalidJson(_) => String::from("Invalid JSON"),
            TcParseError::NoCommand => String::from("No command provided"),
            TcParseError::InvalidCommand(_) => String::from("Invalid command"),
            TcParseError::InvalidTarget(s) => s.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse the `joint`/`value` pair of a target request.
fn parse_target(joint: &Value, value: &Value) -> Result<JointTarget, TcParseError> {
    let name = joint
        .as_str()
        .ok_or_else(|| TcParseError::InvalidTarget(String::from("Invalid joint")))?;

    if name.eq_ignore_ascii_case("emergency_stop") {
        return Ok(JointTarget::EmergencyStop);
    }

    match JointId::from_name(name) {
        Some(JointId::Gripper) => value
            .as_str()
            .and_then(GripperState::from_label)
            .map(JointTarget::Gripper)
            .ok_or_else(|| {
                TcParseError::InvalidTarget(String::from(
                    "Invalid gripper state (must be 'open' or 'closed')",
                ))
            }),
        Some(joint) => parse_angle(value)
            .map(|deg| JointTarget::Angle { joint, deg })
            .ok_or_else(|| TcParseError::InvalidTarget(String::from("Invalid angle value"))),
        None => Err(TcParseError::InvalidTarget(String::from("Invalid joint"))),
    }
}

/// Read an angle given as an integer, a float (truncated) or a numeric string.
fn parse_angle(value: &Value) -> Option<i32> {
    let deg = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64()?.trunc() as i64,
        },
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    i32::try_from(deg).ok()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_command() {
        let tc = Tc::from_json(r#"{"command": "WAIST_LEFT"}"#).unwrap();
        assert_eq!(tc, Tc::Arm(ArmCmd::WaistLeft));

        let tc = Tc::from_json(r#"{"command": "EMERGENCY_STOP"}"#).unwrap();
        assert_eq!(tc, Tc::Arm(ArmCmd::EmergencyStop));
    }

    #[test]
    fn test_parse_rejections() {
        let resp = |s: &str| TcResponse::from(&Tc::from_json(s).unwrap_err());

        assert_eq!(resp("{not json"), TcResponse::Rejected("Invalid JSON".into()));
        assert_eq!(resp("{}"), TcResponse::Rejected("No command provided".into()));
        assert_eq!(resp("[1, 2]"), TcResponse::Rejected("No command provided".into()));
        assert_eq!(
            resp(r#"{"command": "DANCE"}"#),
            TcResponse::Rejected("Invalid command".into())
        );
        assert_eq!(
            resp(r#"{"command": null}"#),
            TcResponse::Rejected("Invalid command".into())
        );
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            Tc::from_json(r#"{"joint": "base", "value": 45}"#).unwrap(),
            Tc::Target(JointTarget::Angle {
                joint: JointId::Base,
                deg: 45
            })
        );
        assert_eq!(
            Tc::from_json(r#"{"joint": "Wrist", "value": -30.7}"#).unwrap(),
            Tc::Target(JointTarget::Angle {
                joint: JointId::Wrist,
                deg: -30
            })
        );
        assert_eq!(
            Tc::from_json(r#"{"joint": "elbow", "value": "120"}"#).unwrap(),
            Tc::Target(JointTarget::Angle {
                joint: JointId::Elbow,
                deg: 120
            })
        );
        assert_eq!(
            Tc::from_json(r#"{"joint": "gripper", "value": "CLOSED"}"#).unwrap(),
            Tc::Target(JointTarget::Gripper(GripperState::Closed))
        );
        assert_eq!(
            Tc::from_json(r#"{"joint": "emergency_stop", "value": null}"#).unwrap(),
            Tc::Target(JointTarget::EmergencyStop)
        );

        assert!(matches!(
            Tc::from_json(r#"{"joint": "knee", "value": 10}"#),
            Err(TcParseError::InvalidTarget(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"joint": "gripper", "value": 10}"#),
            Err(TcParseError::InvalidTarget(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"joint": "shoulder", "value": "high"}"#),
            Err(TcParseError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_response_json() {
        assert_eq!(TcResponse::Executing.to_json(), r#"{"status":"Executing"}"#);
        assert_eq!(TcResponse::Stopped.to_json(), r#"{"status":"Stopped"}"#);

        assert_eq!(
            TcResponse::NoMotion.to_json(),
            r#"{"status":"No motion required"}"#
        );
        assert_eq!(
            TcResponse::Rejected("Invalid command".into()).to_json(),
            r#"{"status":"Invalid command"}"#
        );
        assert_eq!(
            TcResponse::ActuatorError("An I2C error occured".into()).to_json(),
            r#"{"status":"Actuator error: An I2C error occured"}"#
        );
    }
}
