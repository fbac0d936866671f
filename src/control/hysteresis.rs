//! Hysteresis fan controller.
//!
//! Speed-ups are applied on the tick they are requested. Slow-downs wait for the
//! countdown to go negative: starting from `N`, every tick whose target is lower than the
//! current speed decrements it, and any applied change resets it to `N`.
//!
//! `current_fan_speed` is committed even when the BMC rejects the change, so it tracks
//! the last speed *requested*, not the one confirmed by hardware. A failed apply is only
//! retried once the curve asks for a different speed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::types::FanConfig;
use crate::control::clock::Sleeper;
use crate::control::curve::SpeedCurve;
use crate::hardware::types::{FanSpeed, TemperatureReading};
use crate::hardware::{FanDriver, TemperatureSensor};

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    SpeedUp { from: FanSpeed, to: FanSpeed, accepted: bool },
    SlowDown { from: FanSpeed, to: FanSpeed, accepted: bool },
    Deferred { target: FanSpeed, countdown: i64 },
    Unchanged,
}

pub struct FanController {
    sensor: Arc<dyn TemperatureSensor>,
    driver: Arc<dyn FanDriver>,
    sleeper: Arc<dyn Sleeper>,
    curve: SpeedCurve,
    interval: Duration,
    slow_down_threshold: i64,
    current_fan_speed: FanSpeed,
    slow_down_countdown: i64,
}

impl FanController {
    pub fn new(
        config: &FanConfig,
        sensor: Arc<dyn TemperatureSensor>,
        driver: Arc<dyn FanDriver>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let threshold = i64::from(config.slow_down_interval_count);
        Self {
            sensor,
            driver,
            sleeper,
            curve: SpeedCurve::new(config),
            interval: config.interval(),
            slow_down_threshold: threshold,
            current_fan_speed: config.default_fan_speed,
            slow_down_countdown: threshold,
        }
    }

    pub fn current_fan_speed(&self) -> FanSpeed {
        self.current_fan_speed
    }

    pub fn slow_down_countdown(&self) -> i64 {
        self.slow_down_countdown
    }

    async fn apply(&mut self, target: FanSpeed) -> bool {
        let accepted = self.driver.set_fan_speed(target).await;
        self.slow_down_countdown = self.slow_down_threshold;
        self.current_fan_speed = target;
        accepted
    }

    /// One read, one curve evaluation, one decision. Sensor I/O errors are returned as-is.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let temp = self.sensor.read_temperature().await?;
        Ok(self.step(temp).await)
    }

    async fn step(&mut self, temp: TemperatureReading) -> TickOutcome {
        let target = self.curve.speed_for(temp);
        let from = self.current_fan_speed;

        if target > from {
            info!("temp={}, speed up fan_speed={} to {}", temp, from, target);
            let accepted = self.apply(target).await;
            TickOutcome::SpeedUp { from, to: target, accepted }
        } else if target < from && self.slow_down_countdown < 0 {
            info!("temp={}, slow fan_speed={} down to {}", temp, from, target);
            let accepted = self.apply(target).await;
            TickOutcome::SlowDown { from, to: target, accepted }
        } else if target < from {
            self.slow_down_countdown -= 1;
            debug!(
                "temp={}, holding fan_speed={} (target {}), countdown={}",
                temp, from, target, self.slow_down_countdown
            );
            TickOutcome::Deferred { target, countdown: self.slow_down_countdown }
        } else {
            TickOutcome::Unchanged
        }
    }

    /// Tick then sleep, `ticks` times.
    pub async fn run_ticks(&mut self, ticks: usize) -> Result<Vec<TickOutcome>> {
        let mut outcomes = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            outcomes.push(self.tick().await?);
            self.sleeper.sleep(self.interval).await;
        }
        Ok(outcomes)
    }

    /// The control loop. Only returns when the sensor can no longer be read.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Control loop started: fan_speed={}, interval={:?}, slow_down_count={}",
            self.current_fan_speed, self.interval, self.slow_down_threshold
        );
        loop {
            self.tick().await?;
            self.sleeper.sleep(self.interval).await;
        }
    }
}
