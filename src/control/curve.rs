//! Temperature to fan speed mapping.
//!
//! Bands are half-open `[previous, below)`. The first band starts just above zero, so a
//! zero or negative reading falls through every band together with readings above the
//! last threshold and the unreadable sentinel: all of them get maximum speed.

use tracing::warn;

use crate::config::types::{CurveBand, FanConfig};
use crate::hardware::types::{FanSpeed, TemperatureReading};

#[derive(Debug, Clone)]
pub struct SpeedCurve {
    bands: Vec<CurveBand>,
    max_fan_speed: FanSpeed,
}

impl SpeedCurve {
    pub fn new(config: &FanConfig) -> Self {
        Self {
            bands: config.curve.clone(),
            max_fan_speed: config.max_fan_speed,
        }
    }

    pub fn speed_for(&self, temp: TemperatureReading) -> FanSpeed {
        if let TemperatureReading::Millidegrees(t) = temp {
            if t > 0 {
                if let Some(band) = self.bands.iter().find(|b| t < b.below) {
                    return band.speed;
                }
            }
        }

        warn!(
            "temp={} exceeds normal range, set fan_speed to max_fan_speed={}",
            temp, self.max_fan_speed
        );
        self.max_fan_speed
    }
}
