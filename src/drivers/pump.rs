//! Shared irrigation pump.
//!
//! One pump feeds every zone; the zone's valve decides where the water
//! goes.  The pump itself is a single bit in the actuator register.
//!
//! Run time is accounted in milliseconds so that the per-round check
//! ([`Pump::seconds_enabled`]) and the telemetry total
//! ([`Pump::total_enabled_seconds`]) agree.

use log::info;

use crate::app::ports::IoBoard;
use crate::drivers::register::RegisterBus;

#[derive(Debug, Default)]
pub struct Pump {
    enabled: bool,
    started_ms: u64,
    accumulated_ms: u64,
}

impl Pump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch on and start timing.  Callers check [`is_enabled`](Self::is_enabled)
    /// first; enabling a running pump restarts its round timer.
    pub fn enable<B: IoBoard>(&mut self, bus: &mut RegisterBus<B>, now: u64) {
        bus.set_pump(true);
        self.enabled = true;
        self.started_ms = now;
        info!("pump: on");
    }

    /// Switch off and fold the elapsed time into the lifetime total.
    pub fn disable<B: IoBoard>(&mut self, bus: &mut RegisterBus<B>, now: u64) {
        bus.set_pump(false);
        if self.enabled {
            self.accumulated_ms += now.saturating_sub(self.started_ms);
            info!("pump: off after {} s", self.seconds_enabled(now));
        }
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Seconds since the last [`enable`](Self::enable); 0 while off.
    pub fn seconds_enabled(&self, now: u64) -> u32 {
        if self.enabled {
            (now.saturating_sub(self.started_ms) / 1000) as u32
        } else {
            0
        }
    }

    /// Accumulated run time of completed rounds.
    pub fn accumulated_seconds(&self) -> u32 {
        (self.accumulated_ms / 1000) as u32
    }

    /// Accumulated run time of completed rounds, optionally zeroing it.
    pub fn total_enabled_seconds(&mut self, clear: bool) -> u32 {
        let total = self.accumulated_seconds();
        if clear {
            self.accumulated_ms = 0;
        }
        total
    }
}
