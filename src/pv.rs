//! PV yield model: weather samples in, AC power samples out.

pub mod irradiance;
pub mod temperature;
pub mod tower;

use bon::bon;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

pub use crate::core::sample::PowerSample;
use crate::{
    core::interval::Interval,
    error::SimulationError,
    prelude::*,
    pv::{
        irradiance::{Orientation, PlaneOfArray},
        temperature::SapmParameters,
    },
    quantity::{Zero, angle::Degrees, irradiance::WattsPerSquareMeter, power::Watts, temperature::Celsius},
    solar::{Location, SolarPosition},
    weather::WeatherSample,
};

/// Fixed array with a single orientation.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayConfig {
    /// DC nameplate power at the standard test conditions.
    pub capacity: Watts,

    pub orientation: Orientation,
}

/// PVWatts inverter.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inverter {
    pub nominal_efficiency: f64,
    pub reference_efficiency: f64,

    /// AC power limit, defaults to the DC nameplate at the nominal efficiency.
    pub ac_limit: Option<Watts>,
}

impl Default for Inverter {
    fn default() -> Self {
        Self { nominal_efficiency: 0.96, reference_efficiency: 0.9637, ac_limit: None }
    }
}

impl Inverter {
    /// Convert the DC input into the AC output.
    ///
    /// `dc_rating` is the array nameplate which sizes the inverter when the AC limit is unset.
    pub fn ac_power(&self, dc_power: Watts, dc_rating: Watts) -> Watts {
        let ac_limit = self.ac_limit.unwrap_or(dc_rating * self.nominal_efficiency);
        if dc_power <= Watts::ZERO || ac_limit <= Watts::ZERO {
            return Watts::ZERO;
        }
        let dc_limit = ac_limit / self.nominal_efficiency;
        let load = dc_power / dc_limit;
        let efficiency = self.nominal_efficiency / self.reference_efficiency
            * (-0.0162 * load - 0.0059 / load + 0.9858);
        (dc_power * efficiency).clamp(Watts::ZERO, ac_limit)
    }
}

/// Complete PV installation: the facets share one inverter.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PvSystem {
    pub arrays: Vec<ArrayConfig>,

    /// Relative DC power change per degree above 25 °C.
    pub temperature_coefficient: f64,

    /// Ground reflectance.
    pub albedo: f64,

    pub cell_temperature: SapmParameters,

    pub inverter: Inverter,

    /// Flat loss factor applied to the AC output: shading, soiling, wiring.
    pub derating: f64,
}

#[bon]
impl PvSystem {
    #[builder]
    pub fn new(
        arrays: Vec<ArrayConfig>,
        #[builder(default = -0.004)] temperature_coefficient: f64,
        #[builder(default = 0.2)] albedo: f64,
        #[builder(default = SapmParameters::OPEN_RACK_GLASS_POLYMER)]
        cell_temperature: SapmParameters,
        #[builder(default)] inverter: Inverter,
        #[builder(default = 0.85)] derating: f64,
    ) -> Result<Self, SimulationError> {
        if arrays.is_empty() {
            return Err(SimulationError::invalid_configuration("PV system has no arrays"));
        }
        for (index, array) in arrays.iter().enumerate() {
            if !(array.capacity.is_finite() && array.capacity >= Watts::ZERO) {
                return Err(SimulationError::invalid_configuration(format!(
                    "array #{index} capacity must be non-negative, got {}",
                    array.capacity,
                )));
            }
            if !(array.orientation.tilt >= Degrees(0.0) && array.orientation.tilt <= Degrees(90.0))
            {
                return Err(SimulationError::invalid_configuration(format!(
                    "array #{index} tilt must be within [0°, 90°], got {}",
                    array.orientation.tilt,
                )));
            }
            if !array.orientation.azimuth.is_finite() {
                return Err(SimulationError::invalid_configuration(format!(
                    "array #{index} azimuth must be finite",
                )));
            }
        }
        if !temperature_coefficient.is_finite() {
            return Err(SimulationError::invalid_configuration(format!(
                "temperature coefficient must be finite, got {temperature_coefficient}"
            )));
        }
        if !(0.0..=1.0).contains(&albedo) {
            return Err(SimulationError::invalid_configuration(format!(
                "albedo must be within [0, 1], got {albedo}"
            )));
        }
        for (name, value) in [
            ("derating", derating),
            ("inverter nominal efficiency", inverter.nominal_efficiency),
            ("inverter reference efficiency", inverter.reference_efficiency),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(SimulationError::invalid_configuration(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }
        if let Some(ac_limit) = inverter.ac_limit
            && !(ac_limit.is_finite() && ac_limit >= Watts::ZERO)
        {
            return Err(SimulationError::invalid_configuration(format!(
                "inverter AC limit must be non-negative, got {ac_limit}"
            )));
        }
        Ok(Self { arrays, temperature_coefficient, albedo, cell_temperature, inverter, derating })
    }
}

impl PvSystem {
    /// Total DC nameplate.
    pub fn dc_capacity(&self) -> Watts {
        self.arrays.iter().map(|array| array.capacity).sum()
    }
}

/// Stateless yield model bound to a site.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct PvYieldModel<'a> {
    system: &'a PvSystem,
    location: Location,
}

impl<'a> PvYieldModel<'a> {
    pub const fn new(system: &'a PvSystem, location: Location) -> Self {
        Self { system, location }
    }

    /// PVWatts DC output of a single array.
    fn array_dc_power(
        &self,
        array: &ArrayConfig,
        weather: &WeatherSample,
        sun: &SolarPosition,
    ) -> Watts {
        let poa = PlaneOfArray::transpose(weather, sun, array.orientation, self.system.albedo);
        let cell_temperature = self.system.cell_temperature.cell_temperature(
            poa.total(),
            weather.temperature,
            weather.wind_speed,
        );
        let temperature_factor = (cell_temperature - Celsius::STC)
            .0
            .mul_add(self.system.temperature_coefficient, 1.0);
        (array.capacity * (poa.effective() / WattsPerSquareMeter::STC) * temperature_factor)
            .max(Watts::ZERO)
    }

    /// Total DC power of all the arrays.
    pub fn dc_power(&self, weather: &WeatherSample) -> Watts {
        let sun = SolarPosition::at(&self.location, weather.timestamp);
        self.system.arrays.iter().map(|array| self.array_dc_power(array, weather, &sun)).sum()
    }

    /// Derated inverter output.
    pub fn ac_power(&self, weather: &WeatherSample) -> Watts {
        self.system.inverter.ac_power(self.dc_power(weather), self.system.dc_capacity())
            * self.system.derating
    }

    /// Convert the weather series into the power series of the same length and order.
    ///
    /// Each sample lasts until the next one starts, the last one lasts `last_duration`.
    #[instrument(skip_all, fields(n_samples = weather.len(), n_arrays = self.system.arrays.len()))]
    pub fn run(&self, weather: &[WeatherSample], last_duration: TimeDelta) -> Vec<PowerSample> {
        let intervals = Interval::chain(weather.iter().map(|sample| sample.timestamp), last_duration);
        let power: Vec<_> = intervals
            .into_iter()
            .zip(weather)
            .map(|(interval, sample)| PowerSample::new(interval, self.ac_power(sample)))
            .collect();
        debug!(
            peak = ?power.iter().map(|sample| sample.power).max(),
            "modelled",
        );
        power
    }
}
