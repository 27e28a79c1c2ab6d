//! Cable-suspended camera platform motion controller: the 50 Hz control
//! cycle, free of any hardware or transport dependency so it can be
//! driven from a desktop test harness as well as from `firmware/`'s RTIC
//! tasks.
//!
//! The public surface is small and deliberately flat: construct a
//! [`Config`](config::Config) and a [`Controller`](controller::Controller),
//! read external inputs into a [`CycleInputs`](controller::CycleInputs)
//! once per tick, and call [`Controller::tick`](controller::Controller::tick).
//! Everything else is collaborator plumbing for `firmware/`.

#![no_std]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod controller;
pub mod duty;
pub mod endpoint;
pub mod monitor;
pub mod pid;
pub mod safety;
pub mod stick;
pub mod telemetry;
pub mod traits;

pub use config::{Config, ConfigError, Mode, RcChannel};
pub use controller::{Controller, CycleInputs};
pub use duty::Duty;
pub use monitor::Monitor;
pub use safety::SafeMode;
