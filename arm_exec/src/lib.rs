//! # Arm library.
//!
//! This library allows other crates in the workspace to access items defined inside the arm
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - turns arm commands into joint angles and actuator demands
pub mod arm_ctrl;

/// Command processor - applies telecommands and forwards their demands to the actuators
pub mod cmd_processor;

/// Global data store for the executable
pub mod data_store;

/// Parameters for the arm executable
pub mod params;

/// Servo control - the actuator sinks demands are written to
pub mod servo_ctrl;
