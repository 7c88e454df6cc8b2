//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (command line,
//! telnet, web front end) that the
//! [`Controller`](super::service::Controller) interprets and acts upon.

use crate::config::{ScheduleTime, SystemMode, WRITE_KEY_LEN};

/// One zone parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSetting {
    PumpSeconds(u8),
    SoakMinutes(u8),
    ThreshDry(u8),
    ThreshWet(u8),
    /// 0 turns the reservoir check off.
    ThreshReservoir(u8),
    MaxIterations(u8),
}

/// One telemetry logger parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggerSetting {
    /// 0 turns logging off.
    IntervalMinutes(u16),
    ChannelId(u32),
    WriteKey(heapless::String<WRITE_KEY_LEN>),
}

/// Commands that external adapters can send into the irrigation core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Water every enabled zone on the next tick (if the mode allows it).
    TriggerWatering,

    /// Start a cycle on one zone right away.
    TriggerZone(usize),

    /// Abort whatever a zone is doing.
    ResetZone(usize),

    /// Ship a data point on the next tick: one zone, or all of them.
    TriggerLog(Option<usize>),

    /// Switch the system mode.  Resets every zone when the mode changes.
    SetMode(SystemMode),

    /// Open or close a valve by hand (manual mode only).
    SetValve { zone: usize, open: bool },

    UpdateZone { zone: usize, setting: ZoneSetting },

    UpdateLogger { zone: usize, setting: LoggerSetting },

    UpdateSchedule { slot: usize, time: ScheduleTime },
}
