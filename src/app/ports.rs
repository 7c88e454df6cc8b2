//! Port traits: the boundary between the irrigation core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! The core consumes these through generics, so none of it touches
//! hardware, the network or flash directly.

use crate::config::{SystemSettings, TelemetrySettings};
use crate::error::{BoardError, Result};
use crate::telemetry::DataPoint;

// ───────────────────────────────────────────────────────────────
// I/O board (driven adapter: domain ↔ hardware)
// ───────────────────────────────────────────────────────────────

/// The three pieces of hardware the core drives: the actuator shift
/// register, the sensor power rail and the single analog input.
///
/// The core only knows the logical bit layout of the register (see
/// [`crate::drivers::register`]); how the byte gets shifted out is up to
/// the implementation.
pub trait IoBoard {
    /// Shift out and latch a new register value.
    fn latch(&mut self, register: u8) -> core::result::Result<(), BoardError>;

    /// Energise or de-energise the shared sensor power rail.
    fn set_sensor_power(&mut self, on: bool) -> core::result::Result<(), BoardError>;

    /// One raw conversion of the currently selected analog channel.
    fn read_analog(&mut self) -> core::result::Result<u16, BoardError>;
}

/// A single raw analog input.  embedded-hal 1.0 has no ADC trait, so
/// board adapters take one of these.
pub trait AnalogInput {
    fn read_raw(&mut self) -> core::result::Result<u16, BoardError>;
}

impl<F> AnalogInput for F
where
    F: FnMut() -> core::result::Result<u16, BoardError>,
{
    fn read_raw(&mut self) -> core::result::Result<u16, BoardError> {
        self()
    }
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time as the scheduler sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Day index (0 = Sunday).  Only compared for change.
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

pub trait Clock {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Local time of day, or `None` until the wall clock is synchronised.
    fn wall_time(&self) -> Option<WallTime>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → remote service)
// ───────────────────────────────────────────────────────────────

/// Ships one data point to the remote telemetry service.
pub trait TelemetrySink {
    /// Returns `false` when the remote channel is unconfigured or the
    /// point could not be handed over.
    fn log(&mut self, zone: usize, remote: &TelemetrySettings, point: &DataPoint) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Settings store (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`SystemSettings`].
///
/// Implementations own change detection and flash-wear debouncing; the
/// core calls [`save`](SettingsStore::save) whenever it changed something.
pub trait SettingsStore {
    /// Load persisted settings.  Implementations return an error when
    /// nothing valid is stored; the caller falls back to defaults.
    fn load(&self) -> Result<SystemSettings>;

    fn save(&mut self, settings: &SystemSettings) -> Result<()>;
}
