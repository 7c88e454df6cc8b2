//! Daily watering schedule.
//!
//! Up to [`NUM_SCHEDULE_SLOTS`] times of day.  Each slot fires at most once
//! per day: when the wall clock shows the slot's hour and minute and the
//! slot has not fired yet on the current day.  The sweep ORs all slots
//! into a single "watering due" signal; the controller then triggers every
//! enabled zone.
//!
//! ```text
//!   slot 0 ─┐
//!   slot 1 ─┤
//!     ...   ├── OR ──▶ watering due ──▶ Controller ──▶ zone.trigger()
//!   slot 7 ─┘
//! ```
//!
//! No wall time (clock not synchronised yet) means nothing is due.

use log::info;

use crate::app::ports::WallTime;
use crate::config::{NUM_SCHEDULE_SLOTS, ScheduleTime};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Slot
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    time: ScheduleTime,
    /// Day on which the slot last fired.
    day_fired: Option<u8>,
}

impl ScheduleSlot {
    pub const fn new(time: ScheduleTime) -> Self {
        Self {
            time,
            day_fired: None,
        }
    }

    pub fn time(&self) -> ScheduleTime {
        self.time
    }

    /// Replace the slot's time.  Does not forget that the slot already
    /// fired today.
    pub fn set_time(&mut self, time: ScheduleTime) {
        self.time = time;
    }

    pub fn is_due(&mut self, now: WallTime) -> bool {
        if !self.time.is_valid() || self.day_fired == Some(now.day) {
            return false;
        }
        let due = now.hour == self.time.hour && now.minute == self.time.minute;
        if due {
            self.day_fired = Some(now.day);
            info!("schedule: watering due at {}", self.time);
        }
        due
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    slots: [ScheduleSlot; NUM_SCHEDULE_SLOTS],
}

impl Scheduler {
    pub fn new(times: [ScheduleTime; NUM_SCHEDULE_SLOTS]) -> Self {
        Self {
            slots: times.map(ScheduleSlot::new),
        }
    }

    /// Evaluate every slot.  All slots are visited so that each one
    /// records its firing day even when another already fired.
    pub fn is_due(&mut self, now: Option<WallTime>) -> bool {
        let Some(now) = now else {
            return false;
        };
        self.slots
            .iter_mut()
            .fold(false, |due, slot| slot.is_due(now) | due)
    }

    pub fn slot(&self, index: usize) -> Option<&ScheduleSlot> {
        self.slots.get(index)
    }

    pub fn set_slot(&mut self, index: usize, time: ScheduleTime) -> Result<()> {
        time.validate()?;
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::Config("schedule slot out of range"))?;
        slot.set_time(time);
        info!("schedule: slot {} set to {}", index, time);
        Ok(())
    }

    pub fn times(&self) -> [ScheduleTime; NUM_SCHEDULE_SLOTS] {
        self.slots.map(|s| s.time())
    }
}
