//! Irradiance on the plane of array.

use serde::{Deserialize, Serialize};

use crate::{
    quantity::{Zero, angle::Degrees, irradiance::WattsPerSquareMeter},
    solar::SolarPosition,
    weather::WeatherSample,
};

/// Refractive index of the module glass.
const GLASS_REFRACTIVE_INDEX: f64 = 1.526;

/// Glazing extinction coefficient, 1/m.
const GLASS_EXTINCTION: f64 = 4.0;

/// Glazing thickness, m.
const GLASS_THICKNESS: f64 = 0.002;

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// From the horizontal: 0° is flat, 90° is vertical.
    pub tilt: Degrees,

    /// Direction the surface faces, clockwise from the north: 180° is south.
    pub azimuth: Degrees,
}

impl Orientation {
    pub const fn vertical(azimuth: Degrees) -> Self {
        Self { tilt: Degrees(90.0), azimuth }
    }
}

/// Angle between the sun rays and the surface normal.
pub fn angle_of_incidence(sun: &SolarPosition, orientation: Orientation) -> Degrees {
    let cos_aoi = sun.zenith.cos() * orientation.tilt.cos()
        + sun.zenith.sin() * orientation.tilt.sin() * (sun.azimuth - orientation.azimuth).cos();
    Degrees::from_radians(cos_aoi.clamp(-1.0, 1.0).acos())
}

/// Incidence angle modifier of the glass cover: Fresnel reflection plus absorption.
///
/// Normalized to `1.0` at the normal incidence and `0.0` at and beyond 90°.
#[must_use]
pub fn physical_iam(aoi: Degrees) -> f64 {
    if aoi.abs() >= Degrees(90.0) {
        return 0.0;
    }
    let n = GLASS_REFRACTIVE_INDEX;
    let absorption = GLASS_EXTINCTION * GLASS_THICKNESS;

    // Avoid the singularity at the exact normal incidence:
    let aoi = aoi.abs().max(Degrees(1e-6));
    let (cos_a, sin_a) = (aoi.cos(), aoi.sin());

    // Snell's law:
    let sin_b = sin_a / n;
    let cos_b = (1.0 - sin_b * sin_b).sqrt();

    let rho_s = ((cos_a - n * cos_b) / (cos_a + n * cos_b)).powi(2);
    let rho_p = ((cos_b - n * cos_a) / (cos_b + n * cos_a)).powi(2);
    let rho_0 = ((1.0 - n) / (1.0 + n)).powi(2);

    let transmittance = (2.0 - rho_s - rho_p) / 2.0 * (-absorption / cos_b).exp();
    let normal_transmittance = (1.0 - rho_0) * (-absorption).exp();
    (transmittance / normal_transmittance).clamp(0.0, 1.0)
}

/// Plane-of-array irradiance components.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneOfArray {
    pub aoi: Degrees,
    pub beam: WattsPerSquareMeter,
    pub sky_diffuse: WattsPerSquareMeter,
    pub ground_diffuse: WattsPerSquareMeter,
}

impl PlaneOfArray {
    /// Transpose the horizontal weather sample onto the tilted plane, isotropic sky.
    pub fn transpose(
        weather: &WeatherSample,
        sun: &SolarPosition,
        orientation: Orientation,
        albedo: f64,
    ) -> Self {
        let aoi = angle_of_incidence(sun, orientation);
        let beam = if sun.is_above_horizon() {
            (weather.dni * aoi.cos()).max(WattsPerSquareMeter::ZERO)
        } else {
            WattsPerSquareMeter::ZERO
        };
        let tilt_cos = orientation.tilt.cos();
        Self {
            aoi,
            beam,
            sky_diffuse: weather.dhi * ((1.0 + tilt_cos) / 2.0),
            ground_diffuse: weather.ghi * (albedo * (1.0 - tilt_cos) / 2.0),
        }
    }

    pub fn total(&self) -> WattsPerSquareMeter {
        self.beam + self.sky_diffuse + self.ground_diffuse
    }

    /// Irradiance reaching the cells after the reflection losses of the beam component.
    pub fn effective(&self) -> WattsPerSquareMeter {
        self.beam * physical_iam(self.aoi) + self.sky_diffuse + self.ground_diffuse
    }
}
