//! Hardware boundaries: the temperature source and the fan driver.

use anyhow::Result;
use async_trait::async_trait;

pub mod ipmi;
pub mod thermal;
pub mod types;

pub use ipmi::IpmiFanDriver;
pub use thermal::ThermalZoneSensor;

use types::{FanSpeed, TemperatureReading};

#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    /// Read one sample. Unparsable content yields the sentinel; I/O errors are returned.
    async fn read_temperature(&self) -> Result<TemperatureReading>;
}

#[async_trait]
pub trait FanDriver: Send + Sync {
    /// Program the fans. `true` only when the BMC accepted every command.
    async fn set_fan_speed(&self, level: FanSpeed) -> bool;
}
