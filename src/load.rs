//! Household load profiles.

use std::{fs, path::Path};

use chrono::{TimeZone, Timelike};
use serde::Deserialize;

use crate::{
    core::sample::PowerSample,
    error::SimulationError,
    prelude::*,
    quantity::{Zero, energy::WattHours, power::Watts, time::Hours},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LoadProfile {
    /// Flat load around the clock.
    Constant(Watts),

    /// Load per local hour of day, starting at midnight.
    Hourly([Watts; 24]),
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self::Constant(Watts(1000.0))
    }
}

/// TOML profile file.
#[derive(Deserialize)]
struct ProfileFile {
    hourly_load_watts: Vec<Watts>,
}

impl LoadProfile {
    pub fn constant(power: Watts) -> Result<Self, SimulationError> {
        Self::validate(power)?;
        Ok(Self::Constant(power))
    }

    pub fn hourly(powers: &[Watts]) -> Result<Self, SimulationError> {
        let powers: [Watts; 24] = powers.try_into().map_err(|_| {
            SimulationError::invalid_configuration(format!(
                "hourly load profile must have 24 values, got {}",
                powers.len(),
            ))
        })?;
        for power in powers {
            Self::validate(power)?;
        }
        Ok(Self::Hourly(powers))
    }

    fn validate(power: Watts) -> Result<(), SimulationError> {
        if power.is_finite() && power >= Watts::ZERO {
            Ok(())
        } else {
            Err(SimulationError::invalid_configuration(format!(
                "load must be a non-negative number, got {power}"
            )))
        }
    }

    /// Parse the profile: `hourly_load_watts = [...]` with 24 values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(text).context("failed to parse the load profile")?;
        Ok(Self::hourly(&file.hourly_load_watts)?)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let profile = Self::from_toml(&text)?;
        info!(daily_energy = ?profile.daily_energy(), "loaded");
        Ok(profile)
    }

    /// Power at the local hour of day.
    pub fn power_at(&self, hour: u32) -> Watts {
        match self {
            Self::Constant(power) => *power,
            Self::Hourly(powers) => powers[hour as usize % 24],
        }
    }

    /// Energy over a full day, for logging.
    fn daily_energy(&self) -> WattHours {
        (0..24).map(|hour| self.power_at(hour) * Hours(1.0)).sum()
    }

    /// Load samples aligned one-to-one with the given series.
    ///
    /// Each sample takes the load of the local hour its interval starts in.
    pub fn series<Tz: TimeZone>(
        &self,
        aligned_to: &[PowerSample],
        time_zone: &Tz,
    ) -> Vec<PowerSample> {
        aligned_to
            .iter()
            .map(|sample| {
                let hour = sample.interval.start_in(time_zone).hour();
                PowerSample::new(sample.interval, self.power_at(hour))
            })
            .collect()
    }
}
