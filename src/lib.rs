//! Irrigo irrigation controller library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module, and the ESP-IDF
//! crates are target dependencies, so the library builds for either
//! target without extra flags.
//!
//! ```text
//!   cargo test                                   # host: library + tests
//!   cargo build --release --features espidf \
//!       --target xtensa-esp32s3-espidf           # firmware binary
//! ```
//!
//! The `espidf` feature only adds the ESP-IDF link step and the `irrigo`
//! binary; it is meaningless on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod irrigation;
pub mod pins;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;
