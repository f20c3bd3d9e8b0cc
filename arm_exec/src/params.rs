//! # Arm Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use crate::servo_ctrl::{pca9685::SERVO_PRESCALE, ControllerConfig};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct ArmExecParams {
    /// Name of the arm control parameter file
    pub arm_ctrl_params: String,

    /// Where actuator demands are sent
    pub sink: SinkKind,

    /// Settle time after each step
    pub step_delay_ms: u64,

    /// Settle time after an emergency stop
    pub stop_delay_ms: u64,

    /// Number of consecutive sink errors tolerated before the arm is reported as in error
    pub max_sink_errors: u64,

    /// Name of the pose archive in the session directory
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    #[serde(default)]
    pub pca9685: Pca9685Params,
}

/// Settings for a PCA9685 servo board.
#[derive(Deserialize, Debug, Clone)]
pub struct Pca9685Params {
    /// 7 bit I2C address of the board
    pub i2c_address: u8,

    /// Output frequency prescale
    pub prescale: u8,

    /// Servo wiring
    #[serde(default)]
    pub servos: ControllerConfig,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Simulated servos which only log their demands
    Sim,

    /// Servos driven by a PCA9685 board on the I2C bus
    Pca9685,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Pca9685Params {
    fn default() -> Self {
        Self {
            i2c_address: 0x40,
            prescale: SERVO_PRESCALE,
            servos: ControllerConfig::default(),
        }
    }
}

impl ArmExecParams {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn stop_delay(&self) -> Duration {
        Duration::from_millis(self.stop_delay_ms)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_archive_name() -> String {
    String::from("arm_pose.csv")
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
