//! IPMI fan driver: switches the BMC to manual fan mode and programs the speed byte.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::types::FanConfig;
use crate::hardware::types::FanSpeed;
use crate::hardware::FanDriver;
use crate::system::executor::{CommandRunner, RawCommand};

const ENABLE_MANUAL_FAN_CONTROL: &str = "0x30 0x30 0x01 0x00";
const SET_ALL_FANS_SPEED_PREFIX: &str = "0x30 0x30 0x02 0xff";

/// Speed byte as the BMC expects it: the level's digits behind a `0x` prefix.
/// Levels are configured "in hex", so level 20 goes out as `0x20`.
pub fn speed_byte(level: FanSpeed) -> String {
    format!("0x{:02}", level)
}

pub fn set_speed_command(level: FanSpeed) -> RawCommand {
    RawCommand::new(&format!("{} {}", SET_ALL_FANS_SPEED_PREFIX, speed_byte(level)))
}

pub fn enable_manual_command() -> RawCommand {
    RawCommand::new(ENABLE_MANUAL_FAN_CONTROL)
}

pub struct IpmiFanDriver {
    runner: Arc<dyn CommandRunner>,
    default_fan_speed: FanSpeed,
    max_fan_speed: FanSpeed,
}

impl IpmiFanDriver {
    pub fn new(config: &FanConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            default_fan_speed: config.default_fan_speed,
            max_fan_speed: config.max_fan_speed,
        }
    }

    fn checked_level(&self, level: FanSpeed) -> FanSpeed {
        if level < self.default_fan_speed || level > self.max_fan_speed {
            warn!("Invalid fan_speed={}, set to max_fan_speed={}", level, self.max_fan_speed);
            return self.max_fan_speed;
        }
        level
    }
}

#[async_trait]
impl FanDriver for IpmiFanDriver {
    async fn set_fan_speed(&self, level: FanSpeed) -> bool {
        let level = self.checked_level(level);

        if !self.runner.attempt(&enable_manual_command()).await.is_success() {
            error!("Failed to set manual fan speed control mode");
            return false;
        }

        if self.runner.attempt(&set_speed_command(level)).await.is_success() {
            info!("Set fan speed to {}", level);
            return true;
        }

        error!("Failed to set fan speed to {}", level);
        false
    }
}
