//! I/O board adapter.
//!
//! Implements [`IoBoard`] over embedded-hal 1.0 traits:
//!
//! - the 74HC595-style actuator register sits on an [`SpiDevice`]; the
//!   device's chip select is wired to the register's latch, so every
//!   one-byte write ends with the new value on the outputs;
//! - the sensor power rail is a plain [`OutputPin`];
//! - the multiplexed probe input is any [`AnalogInput`].
//!
//! Keeps no state of its own.  The shadow register lives in the core.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::app::ports::{AnalogInput, IoBoard};
use crate::error::BoardError;

pub struct SpiBoard<SPI, PWR, ADC> {
    spi: SPI,
    power: PWR,
    analog: ADC,
}

impl<SPI, PWR, ADC> SpiBoard<SPI, PWR, ADC>
where
    SPI: SpiDevice,
    PWR: OutputPin,
    ADC: AnalogInput,
{
    pub fn new(spi: SPI, power: PWR, analog: ADC) -> Self {
        Self { spi, power, analog }
    }

    /// Give the peripherals back.
    pub fn release(self) -> (SPI, PWR, ADC) {
        (self.spi, self.power, self.analog)
    }
}

impl<SPI, PWR, ADC> IoBoard for SpiBoard<SPI, PWR, ADC>
where
    SPI: SpiDevice,
    PWR: OutputPin,
    ADC: AnalogInput,
{
    fn latch(&mut self, register: u8) -> Result<(), BoardError> {
        debug!("board: latch 0b{:08b}", register);
        self.spi
            .write(&[register])
            .map_err(|_| BoardError::RegisterWrite)
    }

    fn set_sensor_power(&mut self, on: bool) -> Result<(), BoardError> {
        let result = if on {
            self.power.set_high()
        } else {
            self.power.set_low()
        };
        result.map_err(|_| BoardError::PowerRail)
    }

    fn read_analog(&mut self) -> Result<u16, BoardError> {
        self.analog.read_raw()
    }
}
