//!
//! A platform-agnostic driver for the INA226 current/voltage/power monitor, built using
//! embedded-hal, together with the polling loop that samples it at a runtime-tunable
//! rate and hands readings to a publisher.
//!
//! The driver and scheduler are `no_std`. The `std` feature adds a JSON file
//! configuration source and a JSON-lines publisher; the `linux` feature builds the
//! `ina226-monitor` service on top of `linux-embedded-hal`.
//!

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod driver;
pub mod publish;
pub mod register;
pub mod scheduler;

pub use config::{ConfigError, ConfigSource};
pub use driver::*;
pub use publish::{Publisher, SensorOutput};
pub use register::Register;
pub use scheduler::{Scheduler, SchedulerError, SchedulerState, TickOutcome};
