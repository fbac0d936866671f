//! BMC fan control driven by a single CPU temperature sensor.
//!
//! Each tick reads the sensor, maps the reading to a fan speed level through a banded curve
//! and hands it to the hysteresis controller, which speeds fans up at once but only slows
//! them down after the slow-down countdown expires. Speed changes reach the BMC as
//! `ipmitool raw` commands.

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod hardware;
pub mod system;
