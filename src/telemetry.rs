//! Per-zone telemetry logger.
//!
//! Every `interval_minutes` the logger borrows the zone's soil probe and
//! the shared reservoir probe (the same sensors the irrigation cycle
//! uses), samples both and hands one [`DataPoint`] to the
//! [`TelemetrySink`].  If the cycle holds a sensor the logger simply waits
//! in the matching `Wait*` state.
//!
//! ```text
//!   Idle ──due──▶ WaitSensor ──▶ SampleSensor ──▶ WaitReservoir ──▶ SampleReservoir ──▶ Idle
//! ```

use core::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::app::ports::{IoBoard, TelemetrySink};
use crate::config::TelemetrySettings;
use crate::irrigation::context::Plant;
use crate::sensors::SensorId;

const MS_PER_MINUTE: u64 = 60 * 1000;

/// One logged sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataPoint {
    pub humidity: u8,
    pub reservoir: u8,
    /// Lifetime pump run time.
    pub pump_total_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Idle,
    WaitSensor,
    SampleSensor,
    WaitReservoir,
    SampleReservoir,
}

impl fmt::Display for LoggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::WaitSensor => "wait sensor",
            Self::SampleSensor => "sample sensor",
            Self::WaitReservoir => "wait reservoir",
            Self::SampleReservoir => "sample reservoir",
        };
        f.write_str(name)
    }
}

pub struct TelemetryLogger {
    zone: usize,
    settings: TelemetrySettings,
    sensor: SensorId,
    state: LoggerState,
    /// `None` forces the next log regardless of the interval.
    previous_log_ms: Option<u64>,
    humidity: u8,
    reservoir: u8,
}

impl TelemetryLogger {
    pub fn new(zone: usize, settings: TelemetrySettings) -> Self {
        Self {
            zone,
            settings,
            sensor: SensorId::Soil(zone),
            state: LoggerState::Idle,
            previous_log_ms: Some(0),
            humidity: 0,
            reservoir: 0,
        }
    }

    /// Log on the next tick instead of waiting for the interval.
    pub fn trigger(&mut self) {
        self.previous_log_ms = None;
    }

    pub fn is_due(&self, zone_enabled: bool, now: u64) -> bool {
        let interval = u64::from(self.settings.logger.interval_minutes) * MS_PER_MINUTE;
        if interval == 0 || !zone_enabled {
            return false;
        }
        self.previous_log_ms
            .is_none_or(|prev| now.saturating_sub(prev) > interval)
    }

    pub fn run<B: IoBoard>(
        &mut self,
        plant: &mut Plant<B>,
        zone_enabled: bool,
        sink: &mut impl TelemetrySink,
        now: u64,
    ) {
        match self.state {
            LoggerState::Idle => {
                if self.is_due(zone_enabled, now) {
                    info!("logger {}: started", self.zone);
                    self.state = LoggerState::WaitSensor;
                }
            }
            LoggerState::WaitSensor => {
                if plant.sensor(self.sensor).is_idle() {
                    plant.enable_sensor(self.sensor, now);
                    self.state = LoggerState::SampleSensor;
                }
            }
            LoggerState::SampleSensor => {
                plant.run_sensor(self.sensor, now);
                if let Some(humidity) = plant.sensor(self.sensor).read() {
                    plant.disable_sensor(self.sensor, now);
                    self.humidity = humidity;
                    self.state = LoggerState::WaitReservoir;
                }
            }
            LoggerState::WaitReservoir => {
                if plant.sensor(SensorId::Reservoir).is_idle() {
                    plant.enable_sensor(SensorId::Reservoir, now);
                    self.state = LoggerState::SampleReservoir;
                }
            }
            LoggerState::SampleReservoir => {
                plant.run_sensor(SensorId::Reservoir, now);
                if let Some(level) = plant.sensor(SensorId::Reservoir).read() {
                    plant.disable_sensor(SensorId::Reservoir, now);
                    self.reservoir = level;

                    let point = DataPoint {
                        humidity: self.humidity,
                        reservoir: self.reservoir,
                        pump_total_seconds: plant.pump.total_enabled_seconds(false),
                    };
                    if sink.log(self.zone, &self.settings, &point) {
                        info!("logger {}: logged {:?}", self.zone, point);
                    } else {
                        debug!("logger {}: sink declined data point", self.zone);
                    }
                    // Stamped even when the sink declined, so an
                    // unconfigured channel does not re-sample every tick.
                    self.previous_log_ms = Some(now);
                    self.state = LoggerState::Idle;
                }
            }
        }
    }

    /// Abort a running sample, releasing whichever sensor is held.
    pub fn reset<B: IoBoard>(&mut self, plant: &mut Plant<B>, now: u64) {
        match self.state {
            LoggerState::Idle => return,
            LoggerState::SampleSensor => plant.disable_sensor(self.sensor, now),
            LoggerState::SampleReservoir => plant.disable_sensor(SensorId::Reservoir, now),
            LoggerState::WaitSensor | LoggerState::WaitReservoir => {}
        }
        self.state = LoggerState::Idle;
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    pub fn humidity(&self) -> u8 {
        self.humidity
    }

    pub fn reservoir(&self) -> u8 {
        self.reservoir
    }

    pub fn previous_log_ms(&self) -> Option<u64> {
        self.previous_log_ms
    }

    // -- Settings --

    pub fn settings(&self) -> &TelemetrySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TelemetrySettings) {
        self.settings = settings;
    }

    pub fn set_interval_minutes(&mut self, minutes: u16) {
        self.settings.logger.interval_minutes = minutes;
    }

    pub fn set_channel_id(&mut self, channel_id: u32) {
        self.settings.channel_id = channel_id;
    }

    pub fn set_write_key(&mut self, key: &str) -> crate::error::Result<()> {
        self.settings.set_write_key(key)
    }
}
