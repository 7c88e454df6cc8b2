//! Controller: the irrigation core's super-loop body and external API.
//!
//! [`Controller`] owns the plant hardware, one irrigation cycle and one
//! telemetry logger per zone, the daily scheduler and the system mode.
//! All I/O flows through port traits handed in at call sites, so the whole
//! controller is testable with mock adapters.
//!
//! ```text
//!   Clock ──────▶ ┌──────────────────────────────────┐ ──▶ TelemetrySink
//!                 │            Controller             │
//!   AppCommand ─▶ │  arbiter · sensors · zones · logs │ ──▶ SettingsStore
//!                 └──────────────────────────────────┘
//!                                 │
//!                                 ▼
//!                              IoBoard
//! ```
//!
//! Per tick the order is fixed: arbiter, sensors, schedule sweep, zones,
//! loggers.  Sensors must see this tick's arbiter state and zones must see
//! this tick's sensor state.

use core::fmt;

use log::{info, warn};

use crate::config::{NUM_ZONES, ScheduleTime, SystemMode, SystemSettings};
use crate::drivers::valve::Valve;
use crate::error::{Error, Result, ZoneFault};
use crate::irrigation::context::Plant;
use crate::irrigation::{CycleState, IrrigationCycle};
use crate::scheduler::Scheduler;
use crate::telemetry::TelemetryLogger;

use super::commands::{AppCommand, LoggerSetting, ZoneSetting};
use super::ports::{Clock, IoBoard, SettingsStore, TelemetrySink};

// ───────────────────────────────────────────────────────────────
// ZoneStatus
// ───────────────────────────────────────────────────────────────

/// Point-in-time report of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStatus {
    pub zone: usize,
    pub settings: crate::config::ZoneSettings,
    pub humidity: u8,
    pub pump_total_seconds: u32,
    pub state: CycleState,
    pub iterations: u8,
    /// [`ZoneFault`] bits.
    pub faults: u8,
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        writeln!(
            f,
            "zone {}: {}",
            self.zone,
            if s.is_enabled() { "on" } else { "off" }
        )?;
        writeln!(f, "            pump time  {:>3} s", s.pump_seconds)?;
        writeln!(f, "           dry thresh  {:>3}", s.thresh_dry)?;
        writeln!(f, "           wet thresh  {:>3}", s.thresh_wet)?;
        writeln!(f, "            soak time  {:>3} m", s.soak_minutes)?;
        if s.reservoir_check_enabled() {
            writeln!(f, "     reservoir thresh  {:>3}", s.thresh_reservoir)?;
        } else {
            writeln!(f, "     reservoir thresh  off")?;
        }
        writeln!(f, "       max iterations  {:>3}", s.max_iterations)?;
        writeln!(f, "----------------------------")?;
        writeln!(f, "   last read humidity  {}", self.humidity)?;
        writeln!(f, "accumulated pump time  {} s", self.pump_total_seconds)?;
        writeln!(f, "                state  {}", self.state)?;
        writeln!(f, "           iterations  {}", self.iterations)?;
        write!(f, "               faults  ")?;
        let mut any = false;
        for fault in [ZoneFault::ReservoirEmpty, ZoneFault::IterationCutoff] {
            if self.faults & fault.mask() != 0 {
                write!(f, "{}{}", if any { ", " } else { "" }, fault)?;
                any = true;
            }
        }
        if !any {
            write!(f, "none")?;
        }
        writeln!(f)
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<B> {
    plant: Plant<B>,
    zones: [IrrigationCycle; NUM_ZONES],
    loggers: [TelemetryLogger; NUM_ZONES],
    scheduler: Scheduler,
    mode: SystemMode,
    /// Manual watering request, consumed by the next tick.
    watering_requested: bool,
    settings_dirty: bool,
    /// Monotonic time of the last tick; used by commands that act between
    /// ticks.
    now_ms: u64,
}

impl<B: IoBoard> Controller<B> {
    /// Build the controller around `board`.  Every zone starts idle, the
    /// pump off, all valves closed and the sensor rail off.
    pub fn new(board: B, settings: SystemSettings) -> Self {
        let SystemSettings {
            zones,
            schedule,
            telemetry,
            mode,
        } = settings;
        let mut telemetry = telemetry.into_iter();

        Self {
            plant: Plant::new(board),
            zones: core::array::from_fn(|i| IrrigationCycle::new(i, zones[i])),
            loggers: core::array::from_fn(|i| {
                TelemetryLogger::new(i, telemetry.next().unwrap_or_default())
            }),
            scheduler: Scheduler::new(schedule),
            mode,
            watering_requested: false,
            settings_dirty: false,
            now_ms: 0,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass of the super-loop.  Never blocks.
    pub fn run(&mut self, clock: &impl Clock, sink: &mut impl TelemetrySink) {
        let now = clock.now_ms();
        self.now_ms = now;

        // 1. Arbiter, then sensors.
        self.plant.run(now);

        // 2. Schedule sweep and manual requests.
        let scheduled = self.scheduler.is_due(clock.wall_time());
        let requested = core::mem::take(&mut self.watering_requested);
        let due = match self.mode {
            SystemMode::Auto => scheduled || requested,
            SystemMode::Manual => requested,
            SystemMode::Off => false,
        };
        if due {
            info!("watering due ({})", if scheduled { "schedule" } else { "manual" });
            for zone in &mut self.zones {
                if zone.is_enabled() {
                    zone.trigger();
                }
            }
        }

        // 3. Zones.
        for zone in &mut self.zones {
            zone.run(&mut self.plant, now);
        }

        // 4. Loggers.
        for (logger, zone) in self.loggers.iter_mut().zip(&self.zones) {
            logger.run(&mut self.plant, zone.is_enabled(), sink, now);
        }
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand) -> Result<()> {
        match cmd {
            AppCommand::TriggerWatering => {
                self.request_watering();
                Ok(())
            }
            AppCommand::TriggerZone(zone) => self.trigger_zone(zone),
            AppCommand::ResetZone(zone) => self.reset_zone(zone),
            AppCommand::TriggerLog(zone) => self.trigger_log(zone),
            AppCommand::SetMode(mode) => {
                self.set_mode(mode);
                Ok(())
            }
            AppCommand::SetValve { zone, open } => self.set_valve(zone, open),
            AppCommand::UpdateZone { zone, setting } => self.update_zone(zone, setting),
            AppCommand::UpdateLogger { zone, setting } => self.update_logger(zone, setting),
            AppCommand::UpdateSchedule { slot, time } => self.update_schedule(slot, time),
        }
    }

    /// Ask for every enabled zone to be watered on the next tick.
    pub fn request_watering(&mut self) {
        info!("watering requested manually");
        self.watering_requested = true;
    }

    /// Start a cycle on one zone immediately.
    pub fn trigger_zone(&mut self, zone: usize) -> Result<()> {
        let zone = check_zone(zone)?;
        if self.mode == SystemMode::Off {
            return Err(Error::Mode(self.mode));
        }
        if !self.zones[zone].is_enabled() {
            return Err(Error::Config("zone is disabled"));
        }
        self.zones[zone].trigger();
        Ok(())
    }

    pub fn reset_zone(&mut self, zone: usize) -> Result<()> {
        let zone = check_zone(zone)?;
        self.zones[zone].reset(&mut self.plant, self.now_ms);
        Ok(())
    }

    /// Force a data point on the next tick for one zone or all of them.
    pub fn trigger_log(&mut self, zone: Option<usize>) -> Result<()> {
        match zone {
            Some(zone) => self.loggers[check_zone(zone)?].trigger(),
            None => self.loggers.iter_mut().for_each(TelemetryLogger::trigger),
        }
        Ok(())
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    /// Switch mode.  A change aborts every running zone and logger and
    /// closes every valve.
    pub fn set_mode(&mut self, mode: SystemMode) {
        if mode == self.mode {
            return;
        }
        for zone in &mut self.zones {
            zone.reset(&mut self.plant, self.now_ms);
        }
        for logger in &mut self.loggers {
            logger.reset(&mut self.plant, self.now_ms);
        }
        // Valves opened by hand belong to no zone.
        self.plant.arbiter.bus_mut().set_valves(0);
        info!("mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        self.settings_dirty = true;
    }

    /// Drive a valve by hand.  Only allowed in manual mode.
    pub fn set_valve(&mut self, zone: usize, open: bool) -> Result<()> {
        let zone = check_zone(zone)?;
        if self.mode != SystemMode::Manual {
            return Err(Error::Mode(self.mode));
        }
        let valve = Valve::for_zone(zone);
        let bus = self.plant.arbiter.bus_mut();
        if open {
            valve.open(bus);
        } else {
            valve.close(bus);
        }
        Ok(())
    }

    pub fn is_valve_open(&self, zone: usize) -> Result<bool> {
        Ok(self.plant.is_open(Valve::for_zone(check_zone(zone)?)))
    }

    // ── Settings ──────────────────────────────────────────────

    /// Change one zone parameter.  Rejected changes leave the zone untouched.
    pub fn update_zone(&mut self, zone: usize, setting: ZoneSetting) -> Result<()> {
        let zone = check_zone(zone)?;
        let mut settings = *self.zones[zone].settings();
        match setting {
            ZoneSetting::PumpSeconds(v) => settings.pump_seconds = v,
            ZoneSetting::SoakMinutes(v) => settings.soak_minutes = v,
            ZoneSetting::ThreshDry(v) => settings.thresh_dry = v,
            ZoneSetting::ThreshWet(v) => settings.thresh_wet = v,
            ZoneSetting::ThreshReservoir(v) => settings.thresh_reservoir = v,
            ZoneSetting::MaxIterations(v) => settings.max_iterations = v,
        }
        settings.validate()?;
        self.zones[zone].set_settings(settings);
        self.settings_dirty = true;
        info!("zone {}: {:?}", zone, setting);
        Ok(())
    }

    pub fn update_logger(&mut self, zone: usize, setting: LoggerSetting) -> Result<()> {
        let logger = &mut self.loggers[check_zone(zone)?];
        match setting {
            LoggerSetting::IntervalMinutes(v) => logger.set_interval_minutes(v),
            LoggerSetting::ChannelId(v) => logger.set_channel_id(v),
            LoggerSetting::WriteKey(key) => logger.set_write_key(&key)?,
        }
        self.settings_dirty = true;
        info!("logger {}: settings updated", zone);
        Ok(())
    }

    pub fn update_schedule(&mut self, slot: usize, time: ScheduleTime) -> Result<()> {
        self.scheduler.set_slot(slot, time)?;
        self.settings_dirty = true;
        Ok(())
    }

    /// Snapshot of everything the settings store persists.
    pub fn settings(&self) -> SystemSettings {
        SystemSettings {
            zones: core::array::from_fn(|i| *self.zones[i].settings()),
            schedule: self.scheduler.times(),
            telemetry: core::array::from_fn(|i| self.loggers[i].settings().clone()),
            mode: self.mode,
        }
    }

    pub fn is_settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    /// Hand the settings to `store` if something changed since the last
    /// successful save.  Returns `true` if a save happened.
    pub fn sync_settings(&mut self, store: &mut impl SettingsStore) -> bool {
        if !self.settings_dirty {
            return false;
        }
        match store.save(&self.settings()) {
            Ok(()) => {
                self.settings_dirty = false;
                true
            }
            Err(e) => {
                warn!("settings save failed: {}", e);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn zone(&self, zone: usize) -> Option<&IrrigationCycle> {
        self.zones.get(zone)
    }

    pub fn logger(&self, zone: usize) -> Option<&TelemetryLogger> {
        self.loggers.get(zone)
    }

    pub fn zone_status(&self, zone: usize) -> Result<ZoneStatus> {
        let cycle = &self.zones[check_zone(zone)?];
        Ok(ZoneStatus {
            zone,
            settings: *cycle.settings(),
            humidity: cycle.humidity(),
            pump_total_seconds: self.plant.pump.accumulated_seconds(),
            state: cycle.state(),
            iterations: cycle.iterations(),
            faults: cycle.faults(),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn plant(&self) -> &Plant<B> {
        &self.plant
    }

    pub fn plant_mut(&mut self) -> &mut Plant<B> {
        &mut self.plant
    }
}

fn check_zone(zone: usize) -> Result<usize> {
    if zone < NUM_ZONES {
        Ok(zone)
    } else {
        Err(Error::InvalidZone(zone))
    }
}
