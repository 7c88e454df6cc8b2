//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter          | Implements      | Connects to                          |
//! |------------------|-----------------|--------------------------------------|
//! | `board`          | IoBoard         | SPI shift register, power GPIO, ADC  |
//! | `log_sink`       | TelemetrySink   | Serial log output                    |
//! | `settings_store` | SettingsStore   | NVS / in-memory blob                 |
//! | `time`           | Clock           | ESP32 system timer + SNTP wall clock |

pub mod board;
pub mod log_sink;
pub mod settings_store;
pub mod time;
