//! Sensor subsystem: the five logical sensors sharing the analog front end.
//!
//! Every zone has a soil probe; all zones share one reservoir-level probe.
//! The [`SensorBank`] owns all of them and is indexed by [`SensorId`], so
//! the irrigation cycle and the telemetry logger of a zone can hold the
//! same sensor without either owning it.

pub mod moisture;

use crate::app::ports::IoBoard;
use crate::config::NUM_ZONES;
use crate::drivers::arbiter::Arbiter;
use moisture::Sensor;

/// Number of logical sensors: one per zone plus the reservoir.
pub const NUM_SENSORS: usize = NUM_ZONES + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorId {
    /// Soil probe of the given zone.
    Soil(usize),
    Reservoir,
}

impl SensorId {
    pub const fn index(self) -> usize {
        match self {
            Self::Soil(zone) => zone,
            Self::Reservoir => NUM_ZONES,
        }
    }

    /// Multiplexer channel the probe is wired to.
    pub const fn channel(self) -> u8 {
        self.index() as u8
    }
}

pub struct SensorBank {
    sensors: [Sensor; NUM_SENSORS],
}

impl SensorBank {
    pub fn new() -> Self {
        Self {
            sensors: core::array::from_fn(|i| Sensor::new(i as u8)),
        }
    }

    pub fn get(&self, id: SensorId) -> &Sensor {
        &self.sensors[id.index()]
    }

    pub fn get_mut(&mut self, id: SensorId) -> &mut Sensor {
        &mut self.sensors[id.index()]
    }

    /// Advance every sensor by one tick.
    pub fn run<B: IoBoard>(&mut self, arbiter: &mut Arbiter<B>, now: u64) {
        for sensor in &mut self.sensors {
            sensor.run(arbiter, now);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }
}

impl Default for SensorBank {
    fn default() -> Self {
        Self::new()
    }
}
