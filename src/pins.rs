//! GPIO / peripheral pin assignments for the irrigation main board.
//!
//! Single source of truth: the firmware entry point references this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Actuator shift register (SPI2)
// ---------------------------------------------------------------------------

/// Register shift clock.
pub const REGISTER_SCLK_GPIO: i32 = 12;
/// Register serial data in.
pub const REGISTER_MOSI_GPIO: i32 = 11;
/// Register storage clock; driven as the SPI chip select so the outputs
/// update at the end of every byte.
pub const REGISTER_LATCH_GPIO: i32 = 10;
/// Shift clock frequency.
pub const REGISTER_SPI_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Sensor front end
// ---------------------------------------------------------------------------

/// Digital output: switches the shared probe supply (active HIGH).
pub const SENSOR_POWER_GPIO: i32 = 4;
/// Multiplexer output into ADC1 channel 4 (GPIO 5 on ESP32-S3).  The
/// oneshot ADC driver needs the typed pin, so `main` takes `gpio5`
/// directly; keep the two in step.
pub const SENSOR_ADC_GPIO: i32 = 5;
