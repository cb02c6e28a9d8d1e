//! Hourly weather for the yield model.

pub mod cache;
pub mod clear_sky;
pub mod pvgis;
mod resample;

use std::{cmp::Ordering, ops::RangeInclusive};

use async_trait::async_trait;
use bon::bon;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::SimulationError,
    prelude::*,
    quantity::{irradiance::WattsPerSquareMeter, speed::MetersPerSecond, temperature::Celsius},
    solar::Location,
};

/// Instantaneous weather at a site.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,

    /// Global horizontal irradiance.
    pub ghi: WattsPerSquareMeter,

    /// Direct normal irradiance.
    pub dni: WattsPerSquareMeter,

    /// Diffuse horizontal irradiance.
    pub dhi: WattsPerSquareMeter,

    /// Ambient air temperature.
    pub temperature: Celsius,

    pub wind_speed: MetersPerSecond,
}

/// Validated weather query: where, which days and how fine.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WeatherRequest {
    pub location: Location,

    /// First day, inclusive.
    pub start: NaiveDate,

    /// Last day, inclusive.
    pub end: NaiveDate,

    /// Step of the resulting series.
    pub resolution: TimeDelta,
}

#[bon]
impl WeatherRequest {
    #[builder]
    pub fn new(
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
        #[builder(default = TimeDelta::hours(1))] resolution: TimeDelta,
    ) -> Result<Self, SimulationError> {
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(SimulationError::invalid_configuration(format!(
                "latitude must be within [-90, 90], got {}",
                location.latitude,
            )));
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(SimulationError::invalid_configuration(format!(
                "longitude must be within [-180, 180], got {}",
                location.longitude,
            )));
        }
        if !location.elevation.is_finite() {
            return Err(SimulationError::invalid_configuration("elevation must be finite"));
        }
        if start > end {
            return Err(SimulationError::invalid_configuration(format!(
                "the period starts on {start} after it ends on {end}"
            )));
        }
        let seconds = resolution.num_seconds();
        let is_aligned = match resolution.cmp(&TimeDelta::hours(1)) {
            Ordering::Less => seconds > 0 && 3600 % seconds == 0 && resolution.subsec_nanos() == 0,
            Ordering::Equal => true,
            Ordering::Greater => seconds % 3600 == 0,
        };
        if !is_aligned {
            return Err(SimulationError::invalid_configuration(format!(
                "resolution must divide an hour or be a whole number of hours, got {resolution}"
            )));
        }
        Ok(Self { location, start, end, resolution })
    }
}

impl WeatherRequest {
    /// Start of the first day in UTC, inclusive.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// End of the last day in UTC, exclusive.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1)
    }

    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        (self.start_time()..self.end_time()).contains(&timestamp)
    }

    #[must_use]
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    /// Turn the raw provider samples into the requested series.
    ///
    /// Samples outside the period are dropped, the rest are ordered by time, deduplicated and
    /// resampled to the requested resolution.
    pub fn prepare(
        &self,
        mut samples: Vec<WeatherSample>,
    ) -> Result<Vec<WeatherSample>, SimulationError> {
        let n_raw = samples.len();
        samples.retain(|sample| self.contains(sample.timestamp));
        samples.sort_by_key(|sample| sample.timestamp);
        samples.dedup_by_key(|sample| sample.timestamp);
        if samples.is_empty() {
            return Err(SimulationError::upstream_data_unavailable(format!(
                "none of {n_raw} weather samples fall within {}..={}",
                self.start, self.end,
            )));
        }
        let samples = match self.resolution.cmp(&TimeDelta::hours(1)) {
            Ordering::Less => resample::interpolate(&samples, self.resolution, self.end_time()),
            Ordering::Equal => samples,
            Ordering::Greater => resample::average(&samples, self.resolution, self.start_time()),
        };
        debug!(n_raw, n_samples = samples.len(), "prepared");
        Ok(samples)
    }
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Stable identifier of the source and its settings.
    fn id(&self) -> String;

    /// Provider samples covering at least the requested period, in any order.
    async fn fetch_raw(&self, request: &WeatherRequest) -> Result<Vec<WeatherSample>>;

    /// Fetch the weather series for the period at the requested resolution.
    #[instrument(skip_all, fields(source = %self.id(), start = %request.start, end = %request.end))]
    async fn fetch(&self, request: &WeatherRequest) -> Result<Vec<WeatherSample>> {
        let samples = self.fetch_raw(request).await?;
        info!(n_samples = samples.len(), "fetched");
        Ok(request.prepare(samples)?)
    }
}
