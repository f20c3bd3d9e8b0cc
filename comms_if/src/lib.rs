//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands and their responses
pub mod tc;

/// Command and demand definitions for equipment (the arm's actuators)
pub mod eqpt;

/// Telemetry reported by the arm executable
pub mod tm;
