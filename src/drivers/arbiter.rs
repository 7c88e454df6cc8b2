//! Peripheral arbiter for the single shared analog front end.
//!
//! Five logical sensors share one ADC input behind an analog multiplexer
//! and one switched sensor power rail.  The arbiter hands the front end to
//! one caller at a time:
//!
//! ```text
//!            request()              POWER_UP_MS              SETUP_MS
//!   Idle ───────────────▶ PoweringUp ──────────▶ Converting ─────────▶ Ready
//!    ▲                        │                      ▲                   │
//!    │ POWER_DOWN_HOLD_MS     │ reset()              │ request()         │ reset()
//!    │                        ▼                      │                   ▼
//!    └────────────────────  Idle        PowerUpIdle ─┴───────────────────┘
//! ```
//!
//! There is no queue.  A `request` that finds the arbiter busy returns
//! `false` and the caller retries on its next tick.
//!
//! Whenever the arbiter is idle the multiplexer is parked on channel 0 and
//! the sensor rail is off.  With the rail off but a channel selected the
//! ADC input would back-feed the sensors through the multiplexer's
//! protection diodes.

use core::fmt;

use log::debug;

use crate::app::ports::IoBoard;
use crate::drivers::register::RegisterBus;
use crate::error::BoardError;

/// Rail stabilisation time after switching the sensors on.
pub const POWER_UP_MS: u64 = 100;
/// Settling time after selecting a multiplexer channel.
pub const SETUP_MS: u64 = 10;
/// How long a released front end stays powered waiting for the next request.
pub const POWER_DOWN_HOLD_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Idle,
    PoweringUp,
    /// Powered and released; a new request skips the power-up delay.
    PowerUpIdle,
    Converting,
    Ready,
}

impl fmt::Display for ArbiterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PoweringUp => "powering-up",
            Self::PowerUpIdle => "power-up-idle",
            Self::Converting => "converting",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

pub struct Arbiter<B> {
    bus: RegisterBus<B>,
    state: ArbiterState,
    channel: u8,
    since_ms: u64,
}

impl<B: IoBoard> Arbiter<B> {
    /// Take over the register bus and park the front end.
    pub fn new(bus: RegisterBus<B>) -> Self {
        let mut arbiter = Self {
            bus,
            state: ArbiterState::Idle,
            channel: 0,
            since_ms: 0,
        };
        arbiter.enter_idle(0);
        arbiter
    }

    /// Ask for the front end on `channel`.
    ///
    /// Returns `false` when somebody else holds it.
    pub fn request(&mut self, channel: u8, now: u64) -> bool {
        match self.state {
            ArbiterState::Idle => {
                self.channel = channel;
                self.bus.set_sensor_power(true);
                self.enter(ArbiterState::PoweringUp, now);
                true
            }
            ArbiterState::PowerUpIdle => {
                if channel != self.channel {
                    self.channel = channel;
                    self.bus.set_adc_channel(channel);
                }
                self.enter(ArbiterState::Converting, now);
                true
            }
            ArbiterState::PoweringUp | ArbiterState::Converting | ArbiterState::Ready => false,
        }
    }

    pub fn run(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.since_ms);
        match self.state {
            ArbiterState::PoweringUp if elapsed >= POWER_UP_MS => {
                self.bus.set_adc_channel(self.channel);
                self.enter(ArbiterState::Converting, now);
            }
            ArbiterState::Converting if elapsed >= SETUP_MS => {
                self.enter(ArbiterState::Ready, now);
            }
            ArbiterState::PowerUpIdle if elapsed >= POWER_DOWN_HOLD_MS => {
                self.enter_idle(now);
            }
            _ => {}
        }
    }

    /// Release the front end.  Keeps it powered if the rail already
    /// settled, otherwise shuts it down.
    pub fn reset(&mut self, now: u64) {
        match self.state {
            ArbiterState::Idle => {}
            ArbiterState::PoweringUp => self.enter_idle(now),
            ArbiterState::PowerUpIdle | ArbiterState::Converting | ArbiterState::Ready => {
                self.enter(ArbiterState::PowerUpIdle, now);
            }
        }
    }

    /// Raw conversion of the selected channel.  Only meaningful in
    /// [`ArbiterState::Ready`].
    pub fn read(&mut self) -> Result<u16, BoardError> {
        self.bus.read_analog()
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ArbiterState::Ready
    }

    /// Channel held by the current (or last) owner.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn bus(&self) -> &RegisterBus<B> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut RegisterBus<B> {
        &mut self.bus
    }

    fn enter_idle(&mut self, now: u64) {
        self.channel = 0;
        self.bus.set_adc_channel(0);
        self.bus.set_sensor_power(false);
        self.enter(ArbiterState::Idle, now);
    }

    fn enter(&mut self, next: ArbiterState, now: u64) {
        if next != self.state {
            debug!("arbiter: {} -> {} (ch {})", self.state, next, self.channel);
        }
        self.state = next;
        self.since_ms = now;
    }
}
