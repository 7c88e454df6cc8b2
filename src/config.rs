//! System configuration parameters
//!
//! Every tunable the irrigation core reads: per-zone watering settings,
//! the daily schedule, per-zone telemetry logging and the system mode.
//! Persisted as a postcard blob by the settings store.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of independent irrigation zones on the board.
pub const NUM_ZONES: usize = 4;
/// Number of daily schedule slots.
pub const NUM_SCHEDULE_SLOTS: usize = 8;
/// Capacity of the remote write key.
pub const WRITE_KEY_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Zone settings
// ---------------------------------------------------------------------------

/// Watering parameters of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSettings {
    /// Pump run time per watering round in seconds.  0 disables the zone.
    pub pump_seconds: u8,
    /// Humidity (0–255) at or below which dry soil starts a cycle.
    pub thresh_dry: u8,
    /// Humidity (0–255) at or below which a running cycle keeps watering.
    pub thresh_wet: u8,
    /// Minutes to let the water percolate before measuring again.
    pub soak_minutes: u8,
    /// Reservoir reading below which the reservoir counts as empty.
    /// 0 turns the reservoir check off.
    pub thresh_reservoir: u8,
    /// Watering rounds after which the cycle gives up even if the soil
    /// still reads dry.  Guards against a broken sensor draining the
    /// reservoir into the pot.
    pub max_iterations: u8,
}

impl ZoneSettings {
    /// Factory settings of a zone with the pump turned off.
    pub const fn disabled() -> Self {
        Self {
            pump_seconds: 0,
            thresh_dry: 180, // ~0.7 * 255
            thresh_wet: 230, // ~0.9 * 255
            soak_minutes: 5,
            thresh_reservoir: 0,
            max_iterations: 20,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pump_seconds > 0
    }

    pub fn reservoir_check_enabled(&self) -> bool {
        self.thresh_reservoir > 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresh_wet < self.thresh_dry {
            return Err(Error::Config("wet threshold must not be below dry threshold"));
        }
        Ok(())
    }
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            pump_seconds: 30,
            ..Self::disabled()
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Time of day at which watering is due.  An hour of [`ScheduleTime::OFF_HOUR`]
/// marks an unused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTime {
    pub hour: u8,
    pub minute: u8,
}

impl ScheduleTime {
    pub const OFF_HOUR: u8 = u8::MAX;

    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub const fn off() -> Self {
        Self {
            hour: Self::OFF_HOUR,
            minute: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hour <= 23
    }

    pub fn validate(&self) -> Result<()> {
        if self.hour != Self::OFF_HOUR && self.hour > 23 {
            return Err(Error::Config("schedule hour must be 0-23 or off"));
        }
        if self.minute > 59 {
            return Err(Error::Config("schedule minute must be 0-59"));
        }
        Ok(())
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:02}:{:02}", self.hour, self.minute)
        } else {
            write!(f, "off")
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry logging
// ---------------------------------------------------------------------------

/// Settings shared by every logger kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Minutes between data points.  0 turns logging off.
    pub interval_minutes: u16,
}

/// Logger settings plus the remote channel the data points are shipped to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TelemetrySettings {
    pub logger: LoggerSettings,
    /// Remote channel id.  0 means unconfigured.
    pub channel_id: u32,
    pub write_key: heapless::String<WRITE_KEY_LEN>,
}

impl TelemetrySettings {
    pub fn is_configured(&self) -> bool {
        self.channel_id != 0
    }

    pub fn set_write_key(&mut self, key: &str) -> Result<()> {
        let mut s = heapless::String::new();
        s.push_str(key)
            .map_err(|()| Error::Config("write key too long"))?;
        self.write_key = s;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// System mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SystemMode {
    /// Nothing triggers watering.
    Off,
    /// Schedule and manual requests trigger watering.
    #[default]
    Auto,
    /// Only manual requests trigger watering; valves may be driven by hand.
    Manual,
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "man"),
        }
    }
}

impl FromStr for SystemMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "off" => Ok(Self::Off),
            "auto" => Ok(Self::Auto),
            "man" => Ok(Self::Manual),
            _ => Err(Error::Config("mode must be one of off, auto, man")),
        }
    }
}

// ---------------------------------------------------------------------------
// Whole system
// ---------------------------------------------------------------------------

/// Everything the settings store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub zones: [ZoneSettings; NUM_ZONES],
    pub schedule: [ScheduleTime; NUM_SCHEDULE_SLOTS],
    pub telemetry: [TelemetrySettings; NUM_ZONES],
    pub mode: SystemMode,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            zones: [
                ZoneSettings::default(),
                ZoneSettings::disabled(),
                ZoneSettings::disabled(),
                ZoneSettings::disabled(),
            ],
            schedule: [
                ScheduleTime::new(6, 0),
                ScheduleTime::new(8, 0),
                ScheduleTime::off(),
                ScheduleTime::off(),
                ScheduleTime::off(),
                ScheduleTime::off(),
                ScheduleTime::new(20, 0),
                ScheduleTime::new(22, 0),
            ],
            telemetry: Default::default(),
            mode: SystemMode::Auto,
        }
    }
}

impl SystemSettings {
    pub fn validate(&self) -> Result<()> {
        for zone in &self.zones {
            zone.validate()?;
        }
        for slot in &self.schedule {
            slot.validate()?;
        }
        Ok(())
    }

    /// Encode into the blob format kept in flash.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Storage("settings encode failed"))
    }

    /// Decode and validate a blob read from flash.
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let settings: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Storage("settings blob corrupted"))?;
        settings.validate()?;
        Ok(settings)
    }
}
