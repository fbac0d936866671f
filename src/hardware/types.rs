//! Hardware value types: temperature readings and fan speed levels.

use std::fmt;

/// Fan speed level in BMC units (not RPM, not percent).
pub type FanSpeed = u8;

/// One sample from the temperature source.
///
/// `Unreadable` is the positive-infinity sentinel: it orders above every finite reading
/// so the speed curve sends it to maximum cooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemperatureReading {
    Millidegrees(i64),
    Unreadable,
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureReading::Millidegrees(v) => write!(f, "{}", v),
            TemperatureReading::Unreadable => write!(f, "inf"),
        }
    }
}
