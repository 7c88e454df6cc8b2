//! Mock adapters for integration tests.
//!
//! Records every register latch and rail change so tests can assert on
//! the actuator history without a real shift register, and lets each test
//! dial in an analog reading per multiplexer channel.

use std::cell::Cell;

use irrigo::app::ports::{Clock, IoBoard, SettingsStore, TelemetrySink, WallTime};
use irrigo::config::{SystemSettings, TelemetrySettings};
use irrigo::drivers::register::{ADC_MASK, PUMP_MASK, VALVE_MASK, VALVE_SHIFT};
use irrigo::error::{BoardError, Error, Result};
use irrigo::telemetry::DataPoint;

/// Raw reading that normalises to bone-dry soil (humidity 5).
pub const RAW_DRY: u16 = 1000;
/// Raw reading that normalises to soaked soil (humidity 255).
pub const RAW_WET: u16 = 0;

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockBoard {
    pub latched: Vec<u8>,
    pub power: bool,
    /// Raw reading per multiplexer channel.
    pub analog: [u16; 8],
    pub reads: usize,
    /// Reads fail while set.
    pub analog_fault: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> u8 {
        self.latched.last().copied().unwrap_or(0)
    }

    pub fn pump_on(&self) -> bool {
        self.register() & PUMP_MASK != 0
    }

    pub fn valves(&self) -> u8 {
        (self.register() & VALVE_MASK) >> VALVE_SHIFT
    }

    pub fn channel(&self) -> u8 {
        self.register() & ADC_MASK
    }

    /// Every register value ever latched had at most one valve bit set.
    pub fn valves_always_one_hot(&self) -> bool {
        self.latched
            .iter()
            .all(|r| ((r & VALVE_MASK) >> VALVE_SHIFT).count_ones() <= 1)
    }
}

impl IoBoard for MockBoard {
    fn latch(&mut self, register: u8) -> core::result::Result<(), BoardError> {
        self.latched.push(register);
        Ok(())
    }

    fn set_sensor_power(&mut self, on: bool) -> core::result::Result<(), BoardError> {
        self.power = on;
        Ok(())
    }

    fn read_analog(&mut self) -> core::result::Result<u16, BoardError> {
        if self.analog_fault {
            return Err(BoardError::AnalogRead);
        }
        self.reads += 1;
        Ok(self.analog[usize::from(self.channel())])
    }
}

// ── FakeClock ─────────────────────────────────────────────────

pub struct FakeClock {
    pub now_ms: Cell<u64>,
    pub wall: Cell<Option<WallTime>>,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn new() -> Self {
        Self {
            now_ms: Cell::new(0),
            wall: Cell::new(None),
        }
    }

    pub fn at(day: u8, hour: u8, minute: u8) -> Self {
        let clock = Self::new();
        clock.set_wall(day, hour, minute);
        clock
    }

    pub fn set_wall(&self, day: u8, hour: u8, minute: u8) {
        self.wall.set(Some(WallTime { day, hour, minute }));
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn wall_time(&self) -> Option<WallTime> {
        self.wall.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub points: Vec<(usize, DataPoint)>,
    /// Calls the sink declined because the channel was unconfigured.
    pub declined: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetrySink for RecordingSink {
    fn log(&mut self, zone: usize, remote: &TelemetrySettings, point: &DataPoint) -> bool {
        if !remote.is_configured() {
            self.declined += 1;
            return false;
        }
        self.points.push((zone, *point));
        true
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    pub saved: Vec<SystemSettings>,
    /// Saves fail while set.
    pub fail: bool,
}

impl SettingsStore for MemStore {
    fn load(&self) -> Result<SystemSettings> {
        self.saved
            .last()
            .cloned()
            .ok_or(Error::Storage("no settings stored"))
    }

    fn save(&mut self, settings: &SystemSettings) -> Result<()> {
        if self.fail {
            return Err(Error::Storage("flash full"));
        }
        self.saved.push(settings.clone());
        Ok(())
    }
}
