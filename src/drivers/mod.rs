//! Actuator drivers and the shared analog front end.

pub mod arbiter;
pub mod pump;
pub mod register;
pub mod valve;
