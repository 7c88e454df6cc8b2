//! Actuator / channel-select shift register.
//!
//! One byte, shifted out LSB first and latched by the board:
//!
//! ```text
//!   bit  7   6   5   4   3     2   1   0
//!      ┌───┬───┬───┬───┬─────┬───┬───┬───┐
//!      │ V4│ V3│ V2│ V1│PUMP │ ADC CHAN  │
//!      └───┴───┴───┴───┴─────┴───┴───┴───┘
//! ```
//!
//! The valve field is one-hot: at most one valve bit is ever latched.
//! [`RegisterBus`] keeps the shadow copy and pushes every change through
//! the [`IoBoard`] port.

use log::warn;

use crate::app::ports::IoBoard;
use crate::error::BoardError;

pub const ADC_MASK: u8 = 0b0000_0111;
pub const ADC_SHIFT: u8 = 0;
pub const PUMP_MASK: u8 = 0b0000_1000;
pub const PUMP_SHIFT: u8 = 3;
pub const VALVE_MASK: u8 = 0b1111_0000;
pub const VALVE_SHIFT: u8 = 4;

/// Replace the bitfield selected by `mask`/`shift` with `value`.
const fn with_field(register: u8, mask: u8, shift: u8, value: u8) -> u8 {
    (register & !mask) | ((value << shift) & mask)
}

const fn field(register: u8, mask: u8, shift: u8) -> u8 {
    (register & mask) >> shift
}

/// Shadow register plus the board it is latched into.
pub struct RegisterBus<B> {
    board: B,
    shadow: u8,
    sensor_power: bool,
}

impl<B: IoBoard> RegisterBus<B> {
    /// Take ownership of the board and latch an all-zero register
    /// (channel 0, pump off, every valve closed).
    pub fn new(board: B) -> Self {
        let mut bus = Self {
            board,
            shadow: 0,
            sensor_power: false,
        };
        bus.transmit();
        bus
    }

    pub fn value(&self) -> u8 {
        self.shadow
    }

    pub fn set_adc_channel(&mut self, channel: u8) {
        self.shadow = with_field(self.shadow, ADC_MASK, ADC_SHIFT, channel);
        self.transmit();
    }

    pub fn adc_channel(&self) -> u8 {
        field(self.shadow, ADC_MASK, ADC_SHIFT)
    }

    pub fn set_pump(&mut self, on: bool) {
        self.shadow = with_field(self.shadow, PUMP_MASK, PUMP_SHIFT, u8::from(on));
        self.transmit();
    }

    pub fn pump(&self) -> bool {
        field(self.shadow, PUMP_MASK, PUMP_SHIFT) != 0
    }

    /// Latch a new valve field.  Refuses (returns `false`) anything with
    /// more than one valve bit set.
    pub fn set_valves(&mut self, valves: u8) -> bool {
        if valves.count_ones() > 1 {
            warn!("register: refusing valve pattern 0b{:04b}, only one valve may be open", valves);
            return false;
        }
        self.shadow = with_field(self.shadow, VALVE_MASK, VALVE_SHIFT, valves);
        self.transmit();
        true
    }

    pub fn valves(&self) -> u8 {
        field(self.shadow, VALVE_MASK, VALVE_SHIFT)
    }

    pub fn set_sensor_power(&mut self, on: bool) {
        self.sensor_power = on;
        if let Err(e) = self.board.set_sensor_power(on) {
            warn!("register: {e}");
        }
    }

    /// Commanded state of the sensor power rail.
    pub fn sensor_power(&self) -> bool {
        self.sensor_power
    }

    pub fn read_analog(&mut self) -> Result<u16, BoardError> {
        self.board.read_analog()
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    fn transmit(&mut self) {
        if let Err(e) = self.board.latch(self.shadow) {
            warn!("register: {e} (0b{:08b})", self.shadow);
        }
    }
}
