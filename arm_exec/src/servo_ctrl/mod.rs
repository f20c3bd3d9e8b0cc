//! # Servo Controller Module
//!
//! This module provides the actuator sinks which arm control demands are written to. A sink is
//! either a simulated set of servos, which only remembers and logs what it was sent, or a
//! [`ServoCtrl`] which drives real servos through a [`ServoDriver`] board.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use comms_if::eqpt::mech::{ActuatorDem, JointId};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period of the servo PWM signal (50 Hz).
///
/// Units: microseconds
pub const PWM_PERIOD_US: f64 = 20_000.0;

/// Widest pulse range accepted by a hobby servo, used when none is configured.
///
/// Units: microseconds
const DEFAULT_MIN_PULSE_US: f64 = 500.0;
const DEFAULT_MAX_PULSE_US: f64 = 2500.0;

/// Full travel of a servo.
///
/// Units: degrees
const SERVO_RANGE_DEG: f64 = 180.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Anything arm demands can be written to.
pub trait ActuatorSink {
    /// Move one actuator to the demanded physical position.
    fn write(&mut self, dem: &ActuatorDem) -> Result<(), ServoError>;

    /// Write a set of demands in order.
    ///
    /// Every demand is attempted, the first error is returned.
    fn write_all(&mut self, dems: &[ActuatorDem]) -> Result<(), ServoError> {
        let mut result = Ok(());

        for dem in dems {
            if let Err(e) = self.write(dem) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }
}

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {
    /// The type that the underlying driver uses for channel identification
    type Channel: Copy + std::fmt::Debug;

    /// Get the driver channel for a channel number, or `None` if the board doesn't have it.
    fn channel(num: u8) -> Option<Self::Channel>;

    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64)
        -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated set of servos.
#[derive(Debug, Default)]
pub struct SimServo {
    positions: HashMap<JointId, u8>,
}

/// Drives the arm's servos through a single driver board.
pub struct ServoCtrl<D: ServoDriver> {
    driver: D,

    servos: HashMap<JointId, (D::Channel, ServoConfig)>,
}

/// Which servo drives each joint. Joints without a servo are left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub base: Option<ServoConfig>,
    #[serde(default)]
    pub shoulder: Option<ServoConfig>,
    #[serde(default)]
    pub elbow: Option<ServoConfig>,
    #[serde(default)]
    pub wrist: Option<ServoConfig>,
    #[serde(default)]
    pub gripper: Option<ServoConfig>,
}

/// Configuration of a single positional servo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Channel on the driver board.
    pub channel: u8,

    /// Pulse width at 0 degrees.
    ///
    /// Units: microseconds
    #[serde(default = "default_min_pulse_us")]
    pub min_pulse_us: f64,

    /// Pulse width at 180 degrees.
    ///
    /// Units: microseconds
    #[serde(default = "default_max_pulse_us")]
    pub max_pulse_us: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0")]
    InvalidDutyCycle,

    #[error("No servo is configured for the {0} joint")]
    NoChannel(JointId),

    #[error("The driver board has no channel {0}")]
    InvalidChannel(u8),

    #[error("The pulse range of the {0} servo must be increasing and shorter than the PWM period")]
    InvalidPulseRange(JointId),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last position written to a joint.
    pub fn position(&self, joint: JointId) -> Option<u8> {
        self.positions.get(&joint).copied()
    }
}

impl ActuatorSink for SimServo {
    fn write(&mut self, dem: &ActuatorDem) -> Result<(), ServoError> {
        trace!("[SIM] {} -> {} deg", dem.joint, dem.pos_deg);
        self.positions.insert(dem.joint, dem.pos_deg);
        Ok(())
    }
}

impl ControllerConfig {
    fn servos(&self) -> [(JointId, Option<ServoConfig>); 5] {
        [
            (JointId::Base, self.base),
            (JointId::Shoulder, self.shoulder),
            (JointId::Elbow, self.elbow),
            (JointId::Wrist, self.wrist),
            (JointId::Gripper, self.gripper),
        ]
    }
}

impl ServoConfig {
    /// Duty cycle which holds the servo at a position.
    pub fn duty_cycle(&self, pos_deg: u8) -> f64 {
        let frac = (pos_deg as f64 / SERVO_RANGE_DEG).min(1.0);
        let pulse_us = self.min_pulse_us + (self.max_pulse_us - self.min_pulse_us) * frac;

        pulse_us / PWM_PERIOD_US
    }
}

impl<D> ServoCtrl<D>
where
    D: ServoDriver,
{
    /// Create a new servo controller.
    ///
    /// ## Arguments
    /// - `driver` - An initialised [`ServoDriver`] board
    /// - `config` - A configuration for the servos managed by this controller
    pub fn new(driver: D, config: &ControllerConfig) -> Result<Self, ServoError> {
        let mut servos = HashMap::new();

        for (joint, servo) in config.servos().iter() {
            let servo = match servo {
                Some(s) => *s,
                None => {
                    debug!("No servo configured for the {} joint", joint);
                    continue;
                }
            };

            if servo.min_pulse_us < 0.0
                || servo.min_pulse_us >= servo.max_pulse_us
                || servo.max_pulse_us > PWM_PERIOD_US
            {
                return Err(ServoError::InvalidPulseRange(*joint));
            }

            let channel = D::channel(servo.channel).ok_or(ServoError::InvalidChannel(servo.channel))?;

            servos.insert(*joint, (channel, servo));
        }

        Ok(Self { driver, servos })
    }

    /// Release the driver board.
    pub fn into_driver(self) -> D {
        self.driver
    }
}

impl<D> ActuatorSink for ServoCtrl<D>
where
    D: ServoDriver,
{
    fn write(&mut self, dem: &ActuatorDem) -> Result<(), ServoError> {
        let (channel, servo) = self
            .servos
            .get(&dem.joint)
            .ok_or(ServoError::NoChannel(dem.joint))?;

        let duty_cycle = servo.duty_cycle(dem.pos_deg);

        trace!(
            "{} -> {} deg on {:?} (duty {:.4})",
            dem.joint,
            dem.pos_deg,
            channel,
            duty_cycle
        );

        self.driver.set_duty_cycle(*channel, duty_cycle)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_min_pulse_us() -> f64 {
    DEFAULT_MIN_PULSE_US
}

fn default_max_pulse_us() -> f64 {
    DEFAULT_MAX_PULSE_US
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Driver which records every duty cycle it's given.
    #[derive(Default)]
    struct FakeDriver {
        duty_cycles: Vec<(u8, f64)>,
    }

    impl ServoDriver for FakeDriver {
        type Channel = u8;

        fn channel(num: u8) -> Option<u8> {
            if num < 16 {
                Some(num)
            } else {
                None
            }
        }

        fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), ServoError> {
            if !(0.0..=1.0).contains(&duty_cycle) {
                return Err(ServoError::InvalidDutyCycle);
            }
            self.duty_cycles.push((channel, duty_cycle));
            Ok(())
        }
    }

    fn servo(channel: u8) -> Option<ServoConfig> {
        Some(ServoConfig {
            channel,
            min_pulse_us: DEFAULT_MIN_PULSE_US,
            max_pulse_us: DEFAULT_MAX_PULSE_US,
        })
    }

    fn full_config() -> ControllerConfig {
        ControllerConfig {
            base: servo(0),
            shoulder: servo(1),
            elbow: servo(2),
            wrist: servo(3),
            gripper: servo(4),
        }
    }

    #[test]
    fn test_duty_cycle_mapping() {
        let s = servo(0).unwrap();

        assert!((s.duty_cycle(0) - 0.025).abs() < 1e-9);
        assert!((s.duty_cycle(90) - 0.075).abs() < 1e-9);
        assert!((s.duty_cycle(180) - 0.125).abs() < 1e-9);
        assert!((s.duty_cycle(255) - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_servo_ctrl_writes_channels() {
        let mut ctrl = ServoCtrl::new(FakeDriver::default(), &full_config()).unwrap();

        ctrl.write(&ActuatorDem {
            joint: JointId::Elbow,
            pos_deg: 90,
        })
        .unwrap();
        ctrl.write(&ActuatorDem {
            joint: JointId::Gripper,
            pos_deg: 0,
        })
        .unwrap();

        let driver = ctrl.into_driver();
        assert_eq!(driver.duty_cycles.len(), 2);
        assert_eq!(driver.duty_cycles[0].0, 2);
        assert!((driver.duty_cycles[0].1 - 0.075).abs() < 1e-9);
        assert_eq!(driver.duty_cycles[1].0, 4);
        assert!((driver.duty_cycles[1].1 - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_unwired_joint() {
        let mut config = full_config();
        config.gripper = None;
        let mut ctrl = ServoCtrl::new(FakeDriver::default(), &config).unwrap();

        let dems = [
            ActuatorDem {
                joint: JointId::Gripper,
                pos_deg: 180,
            },
            ActuatorDem {
                joint: JointId::Base,
                pos_deg: 180,
            },
        ];

        // The base demand is still written after the gripper fails
        assert!(matches!(
            ctrl.write_all(&dems),
            Err(ServoError::NoChannel(JointId::Gripper))
        ));
        assert_eq!(ctrl.into_driver().duty_cycles.len(), 1);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = full_config();
        config.wrist = servo(16);
        assert!(matches!(
            ServoCtrl::new(FakeDriver::default(), &config),
            Err(ServoError::InvalidChannel(16))
        ));

        let mut config = full_config();
        config.base = Some(ServoConfig {
            channel: 0,
            min_pulse_us: 2500.0,
            max_pulse_us: 500.0,
        });
        assert!(matches!(
            ServoCtrl::new(FakeDriver::default(), &config),
            Err(ServoError::InvalidPulseRange(JointId::Base))
        ));
    }

    #[test]
    fn test_sim_servo() {
        let mut sim = SimServo::new();
        assert_eq!(sim.position(JointId::Wrist), None);

        sim.write(&ActuatorDem {
            joint: JointId::Wrist,
            pos_deg: 42,
        })
        .unwrap();
        assert_eq!(sim.position(JointId::Wrist), Some(42));
    }

    #[test]
    fn test_config_from_toml() {
        let config: ControllerConfig = util::params::parse(
            r#"
            [base]
            channel = 0

            [gripper]
            channel = 4
            min_pulse_us = 600.0
            max_pulse_us = 2400.0
            "#,
        )
        .unwrap();

        assert_eq!(config.base, servo(0));
        assert_eq!(config.shoulder, None);
        assert_eq!(config.gripper.unwrap().min_pulse_us, 600.0);
    }
}
