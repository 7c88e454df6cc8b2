//! Shared plant hardware threaded through every zone and logger.
//!
//! `Plant` is the blackboard the per-zone state machines work on: the
//! arbiter (which owns the register bus and through it the board), the
//! sensor bank and the single pump.  Zones and loggers only hold
//! [`SensorId`]s and their own valve; everything they touch goes through
//! the `&mut Plant` they are handed each tick.

use crate::app::ports::IoBoard;
use crate::drivers::arbiter::Arbiter;
use crate::drivers::pump::Pump;
use crate::drivers::register::RegisterBus;
use crate::drivers::valve::Valve;
use crate::sensors::moisture::Sensor;
use crate::sensors::{SensorBank, SensorId};

pub struct Plant<B> {
    pub arbiter: Arbiter<B>,
    pub sensors: SensorBank,
    pub pump: Pump,
}

impl<B: IoBoard> Plant<B> {
    pub fn new(board: B) -> Self {
        Self {
            arbiter: Arbiter::new(RegisterBus::new(board)),
            sensors: SensorBank::new(),
            pump: Pump::new(),
        }
    }

    /// Advance the arbiter, then every sensor, so that sensors see this
    /// tick's arbiter state.
    pub fn run(&mut self, now: u64) {
        self.arbiter.run(now);
        self.sensors.run(&mut self.arbiter, now);
    }

    // -- Sensors --

    pub fn sensor(&self, id: SensorId) -> &Sensor {
        self.sensors.get(id)
    }

    pub fn enable_sensor(&mut self, id: SensorId, now: u64) {
        self.sensors.get_mut(id).enable(&mut self.arbiter, now);
    }

    pub fn run_sensor(&mut self, id: SensorId, now: u64) {
        self.sensors.get_mut(id).run(&mut self.arbiter, now);
    }

    pub fn disable_sensor(&mut self, id: SensorId, now: u64) {
        self.sensors.get_mut(id).disable(&mut self.arbiter, now);
    }

    // -- Actuators --

    /// Open `valve` and start the pump.
    pub fn start_watering(&mut self, valve: Valve, now: u64) {
        valve.open(self.arbiter.bus_mut());
        self.pump.enable(self.arbiter.bus_mut(), now);
    }

    /// Stop the pump and close `valve`.
    pub fn stop_watering(&mut self, valve: Valve, now: u64) {
        self.pump.disable(self.arbiter.bus_mut(), now);
        valve.close(self.arbiter.bus_mut());
    }

    pub fn is_open(&self, valve: Valve) -> bool {
        valve.is_open(self.arbiter.bus())
    }

    pub fn board(&self) -> &B {
        self.arbiter.bus().board()
    }

    pub fn board_mut(&mut self) -> &mut B {
        self.arbiter.bus_mut().board_mut()
    }
}
