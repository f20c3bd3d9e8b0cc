//! # Arm script interpreter module
//!
//! This module provides an interpreter for arm scripts, allowing
//! telecommands to be executed from these scripts.
//!
//! A script is a list of timestamped JSON telecommands, one per line:
//!
//! ```text
//! 0.5: {"command": "WAIST_LEFT"};
//! 1.0: {"joint": "shoulder", "value": 120};
//! ```
//!
//! Lines which don't match this pattern are ignored, so they can be used for
//! comments.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: Tc,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_tcs` to
/// acquire a list of telecommands that need executing.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError),
}

#[derive(Debug, PartialEq)]
pub enum PendingTcs {
    None,
    Some(Vec<Tc>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si._script_path = path;

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of commands
        let mut tc_queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = cap[1]
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Parse the TC from the payload. The scripts contain JSON only.
            let tc = Tc::from_json(&cap[3]).map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            tc_queue.push_back(Command { exec_time_s, tc });
        }

        if tc_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        // Lines may be out of order, execution follows the timestamps. The sort is stable so
        // commands sharing a time keep their script order.
        tc_queue
            .make_contiguous()
            .sort_by(|a, b| a.exec_time_s.total_cmp(&b.exec_time_s));

        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            cmds: tc_queue,
        })
    }

    /// Return the TCs which are due at the current session time.
    pub fn get_pending_tcs(&mut self) -> PendingTcs {
        self.get_pending_at(get_elapsed_seconds())
    }

    /// Return the TCs whose execution time is before `current_time_s`.
    pub fn get_pending_at(&mut self, current_time_s: f64) -> PendingTcs {
        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<Tc> = vec![];

        // Pop items from the queue while the head's exec time is lower than
        // the current time.
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s >= current_time_s {
                break;
            }
            if let Some(cmd) = self.cmds.pop_front() {
                tc_vec.push(cmd.tc);
            }
        }

        if tc_vec.is_empty() {
            PendingTcs::None
        } else {
            PendingTcs::Some(tc_vec)
        }
    }

    /// Get the number of TCs in the script
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::mech::JointId;
    use comms_if::tc::arm_ctrl::{ArmCmd, JointTarget};

    const SCRIPT: &str = r#"
# Wave the base, then raise the shoulder
0.5: {"command": "WAIST_LEFT"};
0.5: {"command": "WAIST_RIGHT"};
1.0: {"joint": "shoulder", "value": 120};
2.25: {"command": "EMERGENCY_STOP"};
"#;

    #[test]
    fn test_load_script() {
        let si = ScriptInterpreter::from_script(SCRIPT).unwrap();
        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 2.25);
    }

    #[test]
    fn test_pending_tcs() {
        let mut si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        assert_eq!(si.get_pending_at(0.1), PendingTcs::None);
        assert_eq!(
            si.get_pending_at(0.6),
            PendingTcs::Some(vec![Tc::Arm(ArmCmd::WaistLeft), Tc::Arm(ArmCmd::WaistRight)])
        );
        assert_eq!(si.get_pending_at(0.6), PendingTcs::None);
        assert_eq!(
            si.get_pending_at(5.0),
            PendingTcs::Some(vec![
                Tc::Target(JointTarget::Angle {
                    joint: JointId::Shoulder,
                    deg: 120
                }),
                Tc::Arm(ArmCmd::EmergencyStop)
            ])
        );
        assert_eq!(si.get_pending_at(6.0), PendingTcs::EndOfScript);
    }

    #[test]
    fn test_out_of_order_script() {
        let mut si = ScriptInterpreter::from_script(
            r#"
3.0: {"command": "EMERGENCY_STOP"};
1.0: {"command": "ELBOW_UP"};
1.0: {"command": "ELBOW_DOWN"};
"#,
        )
        .unwrap();

        assert_eq!(si.get_duration(), 3.0);
        assert_eq!(
            si.get_pending_at(1.5),
            PendingTcs::Some(vec![Tc::Arm(ArmCmd::ElbowUp), Tc::Arm(ArmCmd::ElbowDown)])
        );
        assert_eq!(
            si.get_pending_at(3.5),
            PendingTcs::Some(vec![Tc::Arm(ArmCmd::EmergencyStop)])
        );
    }

    #[test]
    fn test_invalid_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_script("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script(r#"1.0: {"command": "JUMP"};"#),
            Err(ScriptError::InvalidTc(t, TcParseError::InvalidCommand(_))) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::new("/definitely/not/a/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
