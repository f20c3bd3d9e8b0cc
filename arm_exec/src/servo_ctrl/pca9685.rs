//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Address, Channel, Pca9685};

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MAX_PWM: u16 = 4096;

/// Prescale giving a 50 Hz output from the board's 25 MHz oscillator.
pub const SERVO_PRESCALE: u8 = 121;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Channel = Channel;

    fn channel(num: u8) -> Option<Self::Channel> {
        Some(match num {
            0 => Channel::C0,
            1 => Channel::C1,
            2 => Channel::C2,
            3 => Channel::C3,
            4 => Channel::C4,
            5 => Channel::C5,
            6 => Channel::C6,
            7 => Channel::C7,
            8 => Channel::C8,
            9 => Channel::C9,
            10 => Channel::C10,
            11 => Channel::C11,
            12 => Channel::C12,
            13 => Channel::C13,
            14 => Channel::C14,
            15 => Channel::C15,
            _ => return None,
        })
    }

    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError> {
        // If the duty cycle is out of range return an error
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ServoError::InvalidDutyCycle);
        }

        // Pulse starts at the beginning of the period, the off count must be below MAX_PWM
        let off = ((duty_cycle * MAX_PWM as f64) as u16).min(MAX_PWM - 1);

        self.set_channel_on_off(channel, 0, off).map_err(map_err)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set up a PCA9685 board for driving servos and enable its outputs.
///
/// ## Arguments
/// - `i2c` - The I2C bus the board is on
/// - `address` - The 7 bit address of the board (0x40 by default)
/// - `prescale` - Output frequency prescaler, [`SERVO_PRESCALE`] for standard servos
pub fn init_board<I2C, E>(i2c: I2C, address: u8, prescale: u8) -> Result<Pca9685<I2C>, ServoError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    let mut pwm = Pca9685::new(i2c, Address::from(address)).map_err(map_err)?;

    pwm.set_prescale(prescale).map_err(map_err)?;
    pwm.enable().map_err(map_err)?;

    Ok(pwm)
}

fn map_err<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::InvalidDutyCycle,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// I2C bus which records writes, and can be made to fail.
    #[derive(Default)]
    struct FakeI2c {
        writes: Vec<(u8, Vec<u8>)>,
        fail: bool,
    }

    impl Write for FakeI2c {
        type Error = ();

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.writes.push((address, bytes.to_vec()));
            Ok(())
        }
    }

    impl WriteRead for FakeI2c {
        type Error = ();

        fn write_read(&mut self, _address: u8, _bytes: &[u8], buffer: &mut [u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            for b in buffer.iter_mut() {
                *b = 0;
            }
            Ok(())
        }
    }

    #[test]
    fn test_channels() {
        type Board = Pca9685<FakeI2c>;

        assert!(matches!(<Board as ServoDriver>::channel(0), Some(Channel::C0)));
        assert!(matches!(<Board as ServoDriver>::channel(15), Some(Channel::C15)));
        assert!(<Board as ServoDriver>::channel(16).is_none());
    }

    #[test]
    fn test_set_duty_cycle() {
        let mut board = init_board(FakeI2c::default(), 0x40, SERVO_PRESCALE).unwrap();

        board.set_duty_cycle(Channel::C3, 0.075).unwrap();
        board.set_duty_cycle(Channel::C3, 1.0).unwrap();

        assert!(matches!(
            board.set_duty_cycle(Channel::C3, 1.5),
            Err(ServoError::InvalidDutyCycle)
        ));
        assert!(matches!(
            board.set_duty_cycle(Channel::C3, -0.1),
            Err(ServoError::InvalidDutyCycle)
        ));

        let i2c = board.destroy();
        assert!(!i2c.writes.is_empty());
        assert!(i2c.writes.iter().all(|(addr, _)| *addr == 0x40));
    }

    #[test]
    fn test_bus_failure() {
        let i2c = FakeI2c {
            fail: true,
            ..Default::default()
        };

        assert!(matches!(
            init_board(i2c, 0x40, SERVO_PRESCALE),
            Err(ServoError::I2c)
        ));
    }
}
