//! Daemon configuration: types, defaults, validation and resolution.

pub mod persistence;
pub mod types;
