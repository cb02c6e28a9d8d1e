use crate::quantity::{length::SquareMeters, power::Watts};

quantity!(
    /// Irradiance, or any other surface power density.
    WattsPerSquareMeter, suffix: "W/m²", precision: 0
);

implement_mul!(WattsPerSquareMeter, SquareMeters, Watts);

impl WattsPerSquareMeter {
    /// Standard test conditions irradiance.
    pub const STC: Self = Self(1000.0);
}
