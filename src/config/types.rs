//! Daemon configuration structs, defaults and validation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StartupError;
use crate::hardware::types::FanSpeed;

pub const DEFAULT_SENSOR_PATH: &str = "/sys/class/thermal/thermal_zone1/temp";

/// Largest level that still fits the two-digit speed byte sent to the BMC.
pub const WIRE_SPEED_LIMIT: FanSpeed = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub sensor_path: PathBuf,
    pub default_fan_speed: FanSpeed,
    pub max_fan_speed: FanSpeed,
    pub interval_secs: u64,
    pub slow_down_interval_count: u32,
    pub cmd_timeout_secs: u64,
    pub ipmi: IpmiSettings,
    pub curve: Vec<CurveBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpmiSettings {
    pub tool_path: String,
    pub user: String,
    pub password: String,
    /// Remote BMC reached over lanplus; the local interface is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
}

/// Readings strictly below `below` (millidegrees) map to `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveBand {
    pub below: i64,
    pub speed: FanSpeed,
}

pub fn default_curve() -> Vec<CurveBand> {
    vec![
        CurveBand { below: 50_000, speed: 20 },
        CurveBand { below: 61_000, speed: 32 },
        CurveBand { below: 66_000, speed: 48 },
    ]
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            sensor_path: PathBuf::from(DEFAULT_SENSOR_PATH),
            default_fan_speed: 20,
            max_fan_speed: 64,
            interval_secs: 6,
            slow_down_interval_count: 3,
            cmd_timeout_secs: 3,
            ipmi: IpmiSettings::default(),
            curve: default_curve(),
        }
    }
}

impl Default for IpmiSettings {
    fn default() -> Self {
        Self {
            tool_path: "ipmitool".to_string(),
            user: String::new(),
            password: String::new(),
            host: None,
            port: 623,
        }
    }
}

impl FanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_secs(self.cmd_timeout_secs)
    }

    pub fn speed_in_range(&self, speed: FanSpeed) -> bool {
        speed >= self.default_fan_speed && speed <= self.max_fan_speed
    }

    /// Reject anything the control loop cannot run with. Called once at startup.
    pub fn validate(&self) -> Result<(), StartupError> {
        let invalid = |msg: String| -> Result<(), StartupError> { Err(StartupError::InvalidConfig(msg)) };

        if self.default_fan_speed > self.max_fan_speed {
            return invalid(format!(
                "default_fan_speed ({}) exceeds max_fan_speed ({})",
                self.default_fan_speed, self.max_fan_speed
            ));
        }
        if self.max_fan_speed > WIRE_SPEED_LIMIT {
            return invalid(format!(
                "max_fan_speed ({}) must be at most {}",
                self.max_fan_speed, WIRE_SPEED_LIMIT
            ));
        }
        if self.interval_secs == 0 {
            return invalid("interval_secs must be > 0".to_string());
        }
        if self.cmd_timeout_secs == 0 {
            return invalid("cmd_timeout_secs must be > 0".to_string());
        }
        if self.ipmi.tool_path.trim().is_empty() {
            return invalid("ipmi.tool_path must not be empty".to_string());
        }

        let mut previous = 0;
        for band in &self.curve {
            if band.below <= previous {
                return invalid(format!(
                    "curve thresholds must be positive and strictly ascending (got {} after {})",
                    band.below, previous
                ));
            }
            if !self.speed_in_range(band.speed) {
                return invalid(format!(
                    "curve speed {} outside [{}, {}]",
                    band.speed, self.default_fan_speed, self.max_fan_speed
                ));
            }
            previous = band.below;
        }

        Ok(())
    }

    /// Copy suitable for printing: the BMC password is masked.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.ipmi.password.is_empty() {
            shown.ipmi.password = "********".to_string();
        }
        shown
    }
}
