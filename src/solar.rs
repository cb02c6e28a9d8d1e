//! Solar position after the NOAA general solar position equations.
//!
//! Accurate to a fraction of a degree, which is plenty for hourly yield estimates.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::quantity::{angle::Degrees, irradiance::WattsPerSquareMeter};

/// Mean extraterrestrial irradiance.
pub const SOLAR_CONSTANT: WattsPerSquareMeter = WattsPerSquareMeter(1361.0);

/// Geographic site.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Location {
    /// Degrees north.
    pub latitude: f64,

    /// Degrees east.
    pub longitude: f64,

    /// Meters above the sea level.
    pub elevation: f64,
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct SolarPosition {
    pub day_of_year: u32,

    pub zenith: Degrees,

    /// Clockwise from the north.
    pub azimuth: Degrees,
}

impl SolarPosition {
    pub fn at(location: &Location, timestamp: DateTime<Utc>) -> Self {
        let day_of_year = timestamp.ordinal();
        let hour = f64::from(timestamp.hour())
            + f64::from(timestamp.minute()) / 60.0
            + f64::from(timestamp.second()) / 3600.0;

        // Fractional year:
        let gamma = 2.0 * PI / 365.0 * (f64::from(day_of_year) - 1.0 + (hour - 12.0) / 24.0);

        let equation_of_time = 229.18
            * (0.000_075 + 0.001_868 * gamma.cos()
                - 0.032_077 * gamma.sin()
                - 0.014_615 * (2.0 * gamma).cos()
                - 0.040_849 * (2.0 * gamma).sin());
        let declination = 0.006_918 - 0.399_912 * gamma.cos() + 0.070_257 * gamma.sin()
            - 0.006_758 * (2.0 * gamma).cos()
            + 0.000_907 * (2.0 * gamma).sin()
            - 0.002_697 * (3.0 * gamma).cos()
            + 0.001_48 * (3.0 * gamma).sin();

        // True solar time in minutes, the timestamp is in UTC:
        let true_solar_time = hour * 60.0 + equation_of_time + 4.0 * location.longitude;
        let hour_angle = (true_solar_time / 4.0 - 180.0).to_radians();

        let latitude = location.latitude.to_radians();
        let cos_zenith = latitude.sin() * declination.sin()
            + latitude.cos() * declination.cos() * hour_angle.cos();
        let zenith = cos_zenith.clamp(-1.0, 1.0).acos();
        let azimuth = hour_angle.sin().atan2(
            hour_angle.cos() * latitude.sin() - declination.tan() * latitude.cos(),
        ) + PI;

        Self {
            day_of_year,
            zenith: Degrees::from_radians(zenith),
            azimuth: Degrees::from_radians(azimuth).normalized(),
        }
    }

    #[must_use]
    pub fn is_above_horizon(&self) -> bool {
        self.zenith < Degrees(90.0)
    }

    /// Extraterrestrial normal irradiance corrected for the Earth-Sun distance (Spencer).
    pub fn extraterrestrial_irradiance(&self) -> WattsPerSquareMeter {
        let b = 2.0 * PI * (f64::from(self.day_of_year) - 1.0) / 365.0;
        SOLAR_CONSTANT
            * (1.000_110
                + 0.034_221 * b.cos()
                + 0.001_280 * b.sin()
                + 0.000_719 * (2.0 * b).cos()
                + 0.000_077 * (2.0 * b).sin())
    }
}
