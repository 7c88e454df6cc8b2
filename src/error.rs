//! Unified error types for the irrigation controller.
//!
//! A single `Error` enum that the outer API (validated setters, manual
//! valve control, settings persistence) returns.  The state machines
//! themselves never return errors: hardware write failures are logged and
//! the machine carries on with its shadow state.  All variants are `Copy`.

use core::fmt;

use crate::config::SystemMode;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The I/O board rejected a register latch, power switch or read.
    Board(BoardError),
    /// A setting failed validation.
    Config(&'static str),
    /// Zone index out of range.
    InvalidZone(usize),
    /// The requested operation is not allowed in the current system mode.
    Mode(SystemMode),
    /// The settings store failed to load or save.
    Storage(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(e) => write!(f, "board: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::InvalidZone(zone) => write!(f, "invalid zone index {zone}"),
            Self::Mode(mode) => write!(f, "not allowed in {mode} mode"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Board errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Shifting the register byte out over SPI failed.
    RegisterWrite,
    /// Switching the sensor power rail failed.
    PowerRail,
    /// The analog conversion failed.
    AnalogRead,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterWrite => write!(f, "shift register write failed"),
            Self::PowerRail => write!(f, "sensor power rail switch failed"),
            Self::AnalogRead => write!(f, "analog read failed"),
        }
    }
}

impl From<BoardError> for Error {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}

// ---------------------------------------------------------------------------
// Zone faults
// ---------------------------------------------------------------------------

/// Recoverable per-zone conditions.  Latched in a bitfield on the
/// irrigation cycle so that several can be reported at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ZoneFault {
    /// The last reservoir reading was below the configured threshold.
    ReservoirEmpty = 0b0000_0001,
    /// The cycle hit `max_iterations` and was forced back to idle.
    IterationCutoff = 0b0000_0010,
}

impl ZoneFault {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ZoneFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservoirEmpty => write!(f, "reservoir empty"),
            Self::IterationCutoff => write!(f, "iteration cutoff"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
