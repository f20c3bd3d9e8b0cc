//! # Equipment Interface
//!
//! This module defines the interface structures which will be sent to actuator sinks.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod mech;
