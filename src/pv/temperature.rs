use serde::{Deserialize, Serialize};

use crate::quantity::{
    irradiance::WattsPerSquareMeter,
    speed::MetersPerSecond,
    temperature::Celsius,
};

/// Sandia cell temperature model parameters.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SapmParameters {
    pub a: f64,
    pub b: f64,

    /// Cell-to-module temperature difference at 1000 W/m².
    pub delta_t: f64,
}

impl SapmParameters {
    pub const OPEN_RACK_GLASS_POLYMER: Self = Self { a: -3.56, b: -0.075, delta_t: 3.0 };
    pub const OPEN_RACK_GLASS_GLASS: Self = Self { a: -3.47, b: -0.0594, delta_t: 3.0 };

    pub fn cell_temperature(
        &self,
        irradiance: WattsPerSquareMeter,
        air: Celsius,
        wind_speed: MetersPerSecond,
    ) -> Celsius {
        let module = air + Celsius(irradiance.0 * (self.a + self.b * wind_speed.0).exp());
        module + Celsius(irradiance / WattsPerSquareMeter::STC * self.delta_t)
    }
}
