//! Fixed-cadence polling of a [`PowerSensor`].
//!
//! Every tick re-reads the sample rate, sleeps one period, takes a reading and hands
//! it to the [`Publisher`]. A failed sample or publish is logged and the loop goes
//! on. A sample rate that cannot be determined aborts the tick and is returned to
//! the caller, since there is no valid period to sleep for.

use crate::config::{ConfigError, ConfigSource, UPDATES_PER_SECOND_KEY};
use crate::driver::PowerSensor;
use crate::publish::Publisher;
use core::fmt;
use embedded_hal::delay::DelayNs;
use log::{error, info, trace, warn};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchedulerState {
    /// Between ticks, or sleeping out the current period.
    Waiting,
    /// Reading the sensor and publishing the result.
    Sampling,
}

/// What a completed tick did with its sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    Published,
    PublishFailed,
    SampleFailed,
}

#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("unable to determine polling interval: {0}")]
    Config(#[from] ConfigError),
}

/// Converts a sample rate into the sleep between samples, in microseconds.
pub fn period_us(updates_per_second: f64) -> Result<u64, ConfigError> {
    if !(updates_per_second.is_finite() && updates_per_second > 0.0) {
        return Err(ConfigError::NonPositive(updates_per_second));
    }

    let period = MICROS_PER_SECOND / updates_per_second + 0.5;
    if period >= u64::MAX as f64 {
        return Err(ConfigError::PeriodOutOfRange(updates_per_second));
    }

    Ok(period as u64)
}

pub struct Scheduler<S, C, P, D> {
    sensor: S,
    config: C,
    publisher: P,
    delay: D,
    state: SchedulerState,
    updates_per_second: Option<f64>,
}

impl<S, C, P, D> Scheduler<S, C, P, D>
where
    S: PowerSensor,
    S::Error: fmt::Display,
    C: ConfigSource,
    P: Publisher,
    P::Error: fmt::Display,
    D: DelayNs,
{
    pub fn new(sensor: S, config: C, publisher: P, delay: D) -> Self {
        Self {
            sensor,
            config,
            publisher,
            delay,
            state: SchedulerState::Waiting,
            updates_per_second: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The sample rate used by the most recent tick.
    pub fn updates_per_second(&self) -> Option<f64> {
        self.updates_per_second
    }

    pub fn into_parts(self) -> (S, C, P, D) {
        (self.sensor, self.config, self.publisher, self.delay)
    }

    fn set_state(&mut self, state: SchedulerState) {
        if self.state != state {
            trace!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    // DelayNs takes u32, so long periods are slept in chunks.
    fn sleep_us(&mut self, mut remaining: u64) {
        while remaining > 0 {
            let chunk = remaining.min(u64::from(u32::MAX)) as u32;
            self.delay.delay_us(chunk);
            remaining -= u64::from(chunk);
        }
    }

    /// Runs one fetch-rate, sleep, sample, publish cycle.
    pub fn tick(&mut self) -> Result<TickOutcome, SchedulerError> {
        self.wait_for_next_sample()?;
        Ok(self.sample())
    }

    /// First half of a tick: fetches the rate and sleeps one period, leaving the
    /// scheduler in [`SchedulerState::Sampling`]. On error the state is unchanged.
    pub fn wait_for_next_sample(&mut self) -> Result<(), SchedulerError> {
        let updates_per_second = self.config.get_float(UPDATES_PER_SECOND_KEY)?;
        let period_us = period_us(updates_per_second)?;

        match self.updates_per_second {
            None => info!("Polling at {} updates per second", updates_per_second),
            Some(previous) if previous != updates_per_second => info!(
                "Updates per second changed: {} -> {}",
                previous, updates_per_second
            ),
            Some(_) => {}
        }
        self.updates_per_second = Some(updates_per_second);

        self.sleep_us(period_us);
        self.set_state(SchedulerState::Sampling);

        Ok(())
    }

    /// Second half of a tick: reads the sensor, publishes the reading and returns to
    /// [`SchedulerState::Waiting`].
    pub fn sample(&mut self) -> TickOutcome {
        self.set_state(SchedulerState::Sampling);
        let outcome = match self.sensor.read_sensor_data() {
            Ok(reading) => {
                trace!("{:?}", reading);
                match self.publisher.publish(&reading) {
                    Ok(()) => TickOutcome::Published,
                    Err(e) => {
                        warn!("Could not publish reading: {}", e);
                        TickOutcome::PublishFailed
                    }
                }
            }
            Err(e) => {
                error!("Sensor read failed: {}", e);
                TickOutcome::SampleFailed
            }
        };
        self.set_state(SchedulerState::Waiting);

        outcome
    }

    /// Ticks until the rate cannot be determined.
    pub fn run(&mut self) -> Result<(), SchedulerError> {
        self.run_while(|| true)
    }

    /// Ticks while `keep_running` holds, checking it at every tick boundary.
    pub fn run_while(
        &mut self,
        mut keep_running: impl FnMut() -> bool,
    ) -> Result<(), SchedulerError> {
        while keep_running() {
            self.tick()?;
        }

        Ok(())
    }
}
