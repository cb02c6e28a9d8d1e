//! Ineichen clear-sky weather, for when the sky is assumed cloudless.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    prelude::*,
    quantity::{Zero, irradiance::WattsPerSquareMeter, speed::MetersPerSecond, temperature::Celsius},
    solar::{Location, SolarPosition},
    weather::{WeatherRequest, WeatherSample, WeatherSource},
};

#[must_use]
#[derive(Copy, Clone, Debug, bon::Builder)]
pub struct ClearSky {
    /// Atmospheric turbidity, typically 2 to 7.
    #[builder(default = 3.0)]
    pub linke_turbidity: f64,

    /// Constant ambient temperature.
    #[builder(default = Celsius(20.0))]
    pub temperature: Celsius,

    /// Constant wind speed.
    #[builder(default = MetersPerSecond(0.0))]
    pub wind_speed: MetersPerSecond,
}

impl ClearSky {
    /// Kasten-Young relative air mass, corrected for the site pressure.
    fn absolute_air_mass(sun: &SolarPosition, elevation: f64) -> Option<f64> {
        if !sun.is_above_horizon() {
            return None;
        }
        let zenith = sun.zenith.0;
        let relative = 1.0 / (sun.zenith.cos() + 0.505_72 * (96.079_95 - zenith).powf(-1.636_4));
        let pressure_ratio = (1.0 - 2.255_77e-5 * elevation).powf(5.255_88);
        Some(relative * pressure_ratio)
    }

    /// Clear-sky irradiance at the site and time.
    pub fn sample_at(&self, location: &Location, timestamp: DateTime<Utc>) -> WeatherSample {
        let sun = SolarPosition::at(location, timestamp);
        let mut sample = WeatherSample {
            timestamp,
            ghi: WattsPerSquareMeter::ZERO,
            dni: WattsPerSquareMeter::ZERO,
            dhi: WattsPerSquareMeter::ZERO,
            temperature: self.temperature,
            wind_speed: self.wind_speed,
        };
        let Some(air_mass) = Self::absolute_air_mass(&sun, location.elevation) else {
            return sample;
        };

        let elevation = location.elevation.clamp(-500.0, 11_000.0);
        let turbidity = self.linke_turbidity;
        let extraterrestrial = sun.extraterrestrial_irradiance();
        let cos_zenith = sun.zenith.cos();

        let fh1 = (-elevation / 8000.0).exp();
        let fh2 = (-elevation / 1250.0).exp();
        let cg1 = 5.09e-5_f64.mul_add(elevation, 0.868);
        let cg2 = 3.92e-5_f64.mul_add(elevation, 0.0387);

        let ghi = extraterrestrial
            * (cg1 * cos_zenith * (-cg2 * air_mass * fh2.mul_add(turbidity - 1.0, fh1)).exp())
                .max(0.0);

        let b = 0.664 + 0.163 / fh1;
        let beam = extraterrestrial * (b * (-0.09 * air_mass * (turbidity - 1.0)).exp()).max(0.0);
        let beam_limit = ghi
            * ((1.0 - (0.1 - 0.2 * (-turbidity).exp()) / (0.1 + 0.882 / fh1)) / cos_zenith)
                .clamp(0.0, 1e20);
        let dni = beam.min(beam_limit);

        sample.ghi = ghi;
        sample.dni = dni;
        sample.dhi = (ghi - dni * cos_zenith).max(WattsPerSquareMeter::ZERO);
        sample
    }
}

#[async_trait]
impl WeatherSource for ClearSky {
    fn id(&self) -> String {
        format!("clear-sky-{}-{}-{}", self.linke_turbidity, self.temperature.0, self.wind_speed.0)
    }

    /// Hourly clear-sky samples over the whole period.
    async fn fetch_raw(&self, request: &WeatherRequest) -> Result<Vec<WeatherSample>> {
        let end_time = request.end_time();
        let mut timestamp = request.start_time();
        let mut samples = Vec::new();
        while timestamp < end_time {
            samples.push(self.sample_at(&request.location, timestamp));
            timestamp += TimeDelta::hours(1);
        }
        Ok(samples)
    }
}
