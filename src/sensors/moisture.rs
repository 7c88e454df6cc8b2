//! Averaging soil-moisture / reservoir-level sensor.
//!
//! A sensor owns no hardware.  It borrows the front end from the
//! [`Arbiter`] for the duration of one measurement, takes
//! [`NUM_SAMPLES`] raw conversions [`SAMPLE_INTERVAL_MS`] apart and
//! releases it again on [`Sensor::disable`].
//!
//! The probes read *higher* raw values the *drier* the medium, so the
//! averaged reading is scaled to 8 bits and inverted: 0 is bone dry,
//! 255 is saturated.

use core::fmt;

use log::{debug, warn};

use crate::app::ports::IoBoard;
use crate::drivers::arbiter::Arbiter;

pub const NUM_SAMPLES: u32 = 8;
pub const SAMPLE_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Idle,
    /// Waiting for the arbiter to accept our request.
    Preparing,
    Converting,
    Ready,
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Converting => "converting",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Map an averaged raw conversion onto the 0–255 humidity scale.
pub fn normalize(average_raw: u32) -> u8 {
    (255 - i64::from(average_raw >> 2)).clamp(0, 255) as u8
}

#[derive(Debug)]
pub struct Sensor {
    channel: u8,
    state: SensorState,
    sum: u32,
    samples: u32,
    last_sample_ms: Option<u64>,
    value: u8,
}

impl Sensor {
    pub const fn new(channel: u8) -> Self {
        Self {
            channel,
            state: SensorState::Idle,
            sum: 0,
            samples: 0,
            last_sample_ms: None,
            value: 0,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SensorState::Idle
    }

    /// Start a measurement.  Ignored unless idle.
    pub fn enable<B: IoBoard>(&mut self, arbiter: &mut Arbiter<B>, now: u64) {
        if self.state != SensorState::Idle {
            return;
        }
        self.sum = 0;
        self.samples = 0;
        self.last_sample_ms = None;
        self.state = if arbiter.request(self.channel, now) {
            SensorState::Converting
        } else {
            SensorState::Preparing
        };
    }

    pub fn run<B: IoBoard>(&mut self, arbiter: &mut Arbiter<B>, now: u64) {
        match self.state {
            SensorState::Preparing => {
                if arbiter.request(self.channel, now) {
                    self.state = SensorState::Converting;
                }
            }
            SensorState::Converting => {
                if !arbiter.is_ready() {
                    return;
                }
                let due = self
                    .last_sample_ms
                    .is_none_or(|last| now.saturating_sub(last) >= SAMPLE_INTERVAL_MS);
                if !due {
                    return;
                }
                match arbiter.read() {
                    Ok(raw) => {
                        self.sum += u32::from(raw);
                        self.samples += 1;
                        self.last_sample_ms = Some(now);
                    }
                    // Retried on the next tick.
                    Err(e) => warn!("sensor ch{}: {e}", self.channel),
                }
                if self.samples >= NUM_SAMPLES {
                    self.value = normalize(self.sum / NUM_SAMPLES);
                    debug!("sensor ch{}: {}", self.channel, self.value);
                    self.state = SensorState::Ready;
                }
            }
            SensorState::Idle | SensorState::Ready => {}
        }
    }

    /// Normalised reading, available once the measurement completed.
    pub fn read(&self) -> Option<u8> {
        (self.state == SensorState::Ready).then_some(self.value)
    }

    /// Finish (or abandon) the measurement and release the front end.
    pub fn disable<B: IoBoard>(&mut self, arbiter: &mut Arbiter<B>, now: u64) {
        match self.state {
            SensorState::Converting | SensorState::Ready => arbiter.reset(now),
            SensorState::Preparing | SensorState::Idle => {}
        }
        self.state = SensorState::Idle;
    }
}
