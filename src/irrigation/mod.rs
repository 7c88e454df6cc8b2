//! Per-zone irrigation cycle.
//!
//! ```text
//!  Idle ──trigger──▶ WaitSensor ──▶ Sense ──dry?──▶ WaitReservoir ──▶ SenseReservoir
//!   ▲                    ▲            │ no               ▲                │ low
//!   │                    │            ▼                  │                ▼
//!   │◀───────────────────┼────────── Idle                └──30 min── ReservoirEmpty
//!   │                    │                                                │ ok
//!   │ max iterations     │ soak done                                      ▼
//!   └──────────────── Soaking ◀──── Pumping ◀──────────────────────── WaitPump
//! ```
//!
//! The first sense of a cycle compares against the dry threshold, every
//! later one against the (higher) wet threshold.  `max_iterations` bounds
//! the number of pump rounds whatever the sensor says.
//!
//! Every call to [`IrrigationCycle::run`] does a bounded amount of work
//! and returns; waiting is expressed as staying in a state.

pub mod context;

use core::fmt;

use log::{info, warn};

use crate::app::ports::IoBoard;
use crate::config::ZoneSettings;
use crate::drivers::valve::Valve;
use crate::error::ZoneFault;
use crate::sensors::SensorId;
use context::Plant;

/// Back-off before re-probing an empty reservoir.
pub const RESERVOIR_RECHECK_MS: u64 = 30 * 60 * 1000;

const MS_PER_MINUTE: u64 = 60 * 1000;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    WaitSensor,
    Sense,
    WaitReservoir,
    SenseReservoir,
    WaitPump,
    Pumping,
    Soaking,
    ReservoirEmpty,
}

impl CycleState {
    pub const ALL: [Self; 9] = [
        Self::Idle,
        Self::WaitSensor,
        Self::Sense,
        Self::WaitReservoir,
        Self::SenseReservoir,
        Self::WaitPump,
        Self::Pumping,
        Self::Soaking,
        Self::ReservoirEmpty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WaitSensor => "wait sensor",
            Self::Sense => "sense sensor",
            Self::WaitReservoir => "wait reservoir",
            Self::SenseReservoir => "sense reservoir",
            Self::WaitPump => "wait pump",
            Self::Pumping => "pump",
            Self::Soaking => "soak",
            Self::ReservoirEmpty => "reservoir empty",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// IrrigationCycle
// ---------------------------------------------------------------------------

pub struct IrrigationCycle {
    zone: usize,
    settings: ZoneSettings,
    sensor: SensorId,
    valve: Valve,
    state: CycleState,
    iterations: u8,
    humidity: u8,
    soak_started_ms: u64,
    reservoir_empty_since_ms: u64,
    /// Latched [`ZoneFault`] bits.
    faults: u8,
}

impl IrrigationCycle {
    pub fn new(zone: usize, settings: ZoneSettings) -> Self {
        Self {
            zone,
            settings,
            sensor: SensorId::Soil(zone),
            valve: Valve::for_zone(zone),
            state: CycleState::Idle,
            iterations: 0,
            humidity: 0,
            soak_started_ms: 0,
            reservoir_empty_since_ms: 0,
            faults: 0,
        }
    }

    /// Start a cycle.  Ignored unless idle.
    ///
    /// A disabled zone is not refused here; gating on
    /// [`is_enabled`](Self::is_enabled) is the caller's job.
    pub fn trigger(&mut self) {
        if self.state != CycleState::Idle {
            return;
        }
        self.iterations = 0;
        self.faults = 0;
        self.transition(CycleState::WaitSensor);
    }

    pub fn run<B: IoBoard>(&mut self, plant: &mut Plant<B>, now: u64) {
        match self.state {
            CycleState::Idle => {}

            CycleState::WaitSensor => {
                if plant.sensor(self.sensor).is_idle() {
                    plant.enable_sensor(self.sensor, now);
                    self.transition(CycleState::Sense);
                }
            }

            CycleState::Sense => {
                plant.run_sensor(self.sensor, now);
                let Some(humidity) = plant.sensor(self.sensor).read() else {
                    return;
                };
                plant.disable_sensor(self.sensor, now);
                self.humidity = humidity;

                let threshold = if self.iterations == 0 {
                    self.settings.thresh_dry
                } else {
                    self.settings.thresh_wet
                };
                if humidity > threshold {
                    info!(
                        "zone {}: humidity {} above {}, nothing to do",
                        self.zone, humidity, threshold
                    );
                    self.transition(CycleState::Idle);
                } else if self.settings.reservoir_check_enabled() {
                    self.transition(CycleState::WaitReservoir);
                } else {
                    self.transition(CycleState::WaitPump);
                }
            }

            CycleState::WaitReservoir => {
                if plant.sensor(SensorId::Reservoir).is_idle() {
                    plant.enable_sensor(SensorId::Reservoir, now);
                    self.transition(CycleState::SenseReservoir);
                }
            }

            CycleState::SenseReservoir => {
                plant.run_sensor(SensorId::Reservoir, now);
                let Some(fill) = plant.sensor(SensorId::Reservoir).read() else {
                    return;
                };
                plant.disable_sensor(SensorId::Reservoir, now);

                if fill < self.settings.thresh_reservoir {
                    warn!(
                        "zone {}: reservoir empty (read {}, threshold {})",
                        self.zone, fill, self.settings.thresh_reservoir
                    );
                    self.reservoir_empty_since_ms = now;
                    self.set_fault(ZoneFault::ReservoirEmpty);
                    self.transition(CycleState::ReservoirEmpty);
                } else {
                    self.clear_fault(ZoneFault::ReservoirEmpty);
                    self.transition(CycleState::WaitPump);
                }
            }

            CycleState::WaitPump => {
                if !plant.pump.is_enabled() {
                    plant.start_watering(self.valve, now);
                    self.transition(CycleState::Pumping);
                }
            }

            CycleState::Pumping => {
                if plant.pump.seconds_enabled(now) >= u32::from(self.settings.pump_seconds) {
                    plant.stop_watering(self.valve, now);
                    self.soak_started_ms = now;
                    self.transition(CycleState::Soaking);
                }
            }

            CycleState::Soaking => {
                let soaked_minutes = now.saturating_sub(self.soak_started_ms) / MS_PER_MINUTE;
                if soaked_minutes >= u64::from(self.settings.soak_minutes) {
                    self.iterations = self.iterations.saturating_add(1);
                    if self.iterations >= self.settings.max_iterations {
                        warn!(
                            "zone {}: {} iterations reached, forcing idle",
                            self.zone, self.iterations
                        );
                        self.set_fault(ZoneFault::IterationCutoff);
                        self.transition(CycleState::Idle);
                    } else {
                        self.transition(CycleState::WaitSensor);
                    }
                }
            }

            CycleState::ReservoirEmpty => {
                if now.saturating_sub(self.reservoir_empty_since_ms) >= RESERVOIR_RECHECK_MS {
                    info!("zone {}: re-checking reservoir", self.zone);
                    self.transition(CycleState::WaitReservoir);
                }
            }
        }
    }

    /// Abort whatever the cycle is doing.  Releases a held sensor, stops
    /// the pump and closes the valve if it was watering.  No-op when idle.
    pub fn reset<B: IoBoard>(&mut self, plant: &mut Plant<B>, now: u64) {
        match self.state {
            CycleState::Idle => return,
            CycleState::Sense => plant.disable_sensor(self.sensor, now),
            CycleState::SenseReservoir => plant.disable_sensor(SensorId::Reservoir, now),
            CycleState::Pumping => plant.stop_watering(self.valve, now),
            CycleState::ReservoirEmpty => self.clear_fault(ZoneFault::ReservoirEmpty),
            _ => {}
        }
        info!("zone {}: reset", self.zone);
        self.transition(CycleState::Idle);
    }

    // -- Queries --

    pub fn zone(&self) -> usize {
        self.zone
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn iterations(&self) -> u8 {
        self.iterations
    }

    /// Last soil humidity read by this cycle.
    pub fn humidity(&self) -> u8 {
        self.humidity
    }

    pub fn sensor(&self) -> SensorId {
        self.sensor
    }

    pub fn valve(&self) -> Valve {
        self.valve
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_fault(&self, fault: ZoneFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // -- Settings (unchecked; validation happens in the controller) --

    pub fn settings(&self) -> &ZoneSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ZoneSettings) {
        self.settings = settings;
    }

    pub fn set_pump_seconds(&mut self, seconds: u8) {
        self.settings.pump_seconds = seconds;
    }

    pub fn set_soak_minutes(&mut self, minutes: u8) {
        self.settings.soak_minutes = minutes;
    }

    pub fn set_thresh_dry(&mut self, thresh: u8) {
        self.settings.thresh_dry = thresh;
    }

    pub fn set_thresh_wet(&mut self, thresh: u8) {
        self.settings.thresh_wet = thresh;
    }

    pub fn set_thresh_reservoir(&mut self, thresh: u8) {
        self.settings.thresh_reservoir = thresh;
    }

    pub fn set_max_iterations(&mut self, iterations: u8) {
        self.settings.max_iterations = iterations;
    }

    fn set_fault(&mut self, fault: ZoneFault) {
        self.faults |= fault.mask();
    }

    fn clear_fault(&mut self, fault: ZoneFault) {
        self.faults &= !fault.mask();
    }

    fn transition(&mut self, next: CycleState) {
        info!("zone {}: {} -> {}", self.zone, self.state, next);
        self.state = next;
    }
}
