//! Application core: the irrigation controller behind its ports.
//!
//! The domain logic (arbiter, sensors, zones, schedule, loggers) lives in
//! its own modules; this module wires it into a single [`Controller`]
//! driven through **port traits** defined in [`ports`], keeping the whole
//! core testable without real peripherals.
//!
//! [`Controller`]: service::Controller

pub mod commands;
pub mod ports;
pub mod service;
