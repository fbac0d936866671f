//! sysfs thermal zone reader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{trace, warn};

use crate::hardware::types::TemperatureReading;
use crate::hardware::TemperatureSensor;

pub struct ThermalZoneSensor {
    path: PathBuf,
}

impl ThermalZoneSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode raw sensor text; anything that is not an integer becomes the sentinel.
pub fn parse_reading(raw: &str) -> TemperatureReading {
    match raw.trim().parse::<i64>() {
        Ok(v) => TemperatureReading::Millidegrees(v),
        Err(_) => {
            warn!("{:?} is not a valid number, set to maximum", raw);
            TemperatureReading::Unreadable
        }
    }
}

#[async_trait]
impl TemperatureSensor for ThermalZoneSensor {
    async fn read_temperature(&self) -> Result<TemperatureReading> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read temperature from {:?}", self.path))?;

        let reading = parse_reading(&raw);
        trace!("Read {} from {:?}", reading, self.path);
        Ok(reading)
    }
}
