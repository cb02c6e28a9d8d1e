//! Where and when to simulate.

use chrono::{NaiveDate, TimeDelta};
use chrono_tz::Tz;
use clap::Parser;

use crate::{prelude::*, solar::Location, weather::WeatherRequest};

#[must_use]
#[derive(Parser)]
pub struct SiteArgs {
    /// Degrees north.
    #[clap(long, env = "LATITUDE", default_value = "40", allow_negative_numbers = true)]
    pub latitude: f64,

    /// Degrees east.
    #[clap(long, env = "LONGITUDE", default_value = "-80", allow_negative_numbers = true)]
    pub longitude: f64,

    /// Meters above the sea level.
    #[clap(long, env = "ELEVATION", default_value = "0", allow_negative_numbers = true)]
    pub elevation: f64,

    /// First simulated day, inclusive.
    #[clap(long = "start", env = "START_DATE", default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Last simulated day, inclusive.
    #[clap(long = "end", env = "END_DATE", default_value = "2024-12-31")]
    pub end: NaiveDate,

    /// Simulation step: a divisor of an hour or a whole number of hours.
    #[clap(long, env = "RESOLUTION", default_value = "1h")]
    pub resolution: humantime::Duration,

    /// IANA time zone of the load profile hours and the report periods.
    #[clap(long = "timezone", env = "TIMEZONE", default_value = "UTC")]
    pub time_zone: Tz,
}

impl SiteArgs {
    pub const fn location(&self) -> Location {
        Location { latitude: self.latitude, longitude: self.longitude, elevation: self.elevation }
    }

    pub fn resolution(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.resolution.into()).context("the resolution is out of range")
    }

    pub fn request(&self) -> Result<WeatherRequest> {
        Ok(WeatherRequest::builder()
            .location(self.location())
            .start(self.start)
            .end(self.end)
            .resolution(self.resolution()?)
            .build()?)
    }
}
