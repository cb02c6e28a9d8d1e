//! Cylindrical tower covered with vertical panel columns.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    error::SimulationError,
    pv::{ArrayConfig, irradiance::Orientation},
    quantity::{
        angle::Degrees,
        irradiance::WattsPerSquareMeter,
        length::{Meters, SquareMeters},
        power::Watts,
    },
};

/// Far above any real tower, keeps the facet list allocatable.
const MAX_COLUMNS: f64 = 10_000.0;

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerGeometry {
    pub diameter: Meters,
    pub height: Meters,
    pub panel_width: Meters,
    pub panel_height: Meters,

    /// Nameplate DC power per panel area.
    pub power_density: WattsPerSquareMeter,
}

impl Default for TowerGeometry {
    fn default() -> Self {
        Self {
            diameter: Meters(0.6),
            height: Meters(12.0),
            panel_width: Meters(0.1),
            panel_height: Meters(1.0),
            power_density: WattsPerSquareMeter(175.0),
        }
    }
}

impl TowerGeometry {
    pub fn validate(&self) -> Result<(), SimulationError> {
        for (name, value) in [
            ("diameter", self.diameter),
            ("height", self.height),
            ("panel width", self.panel_width),
            ("panel height", self.panel_height),
        ] {
            if !(value.is_finite() && value > Meters(0.0)) {
                return Err(SimulationError::invalid_configuration(format!(
                    "tower {name} must be positive, got {value}"
                )));
            }
        }
        if !(self.power_density.is_finite() && self.power_density >= WattsPerSquareMeter(0.0)) {
            return Err(SimulationError::invalid_configuration(format!(
                "power density must be non-negative, got {}",
                self.power_density,
            )));
        }
        let columns = PI * self.diameter.0 / self.panel_width.0;
        if columns > MAX_COLUMNS {
            return Err(SimulationError::invalid_configuration(format!(
                "{columns:.0} panel columns of {} do not make a tower",
                self.panel_width,
            )));
        }
        if self.n_rows() == 0 {
            return Err(SimulationError::invalid_configuration(format!(
                "a {} panel does not fit onto a {} tower",
                self.panel_height, self.height,
            )));
        }
        Ok(())
    }

    /// Panel columns around the circumference.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn n_columns(&self) -> usize {
        (PI * self.diameter.0 / self.panel_width.0).ceil() as usize
    }

    /// Panel rows along the height.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn n_rows(&self) -> usize {
        // Tolerate the representation error, so that 1.2 m fits twelve 0.1 m rows:
        (self.height.0 / self.panel_height.0 + 1e-9).floor() as usize
    }

    #[must_use]
    pub fn n_panels(&self) -> usize {
        self.n_columns() * self.n_rows()
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn panel_area(&self) -> SquareMeters {
        self.panel_width * self.panel_height * self.n_panels() as f64
    }

    pub fn dc_capacity(&self) -> Watts {
        self.power_density * self.panel_area()
    }

    /// Model every panel column as a separate vertical array, evenly spread around the tower.
    #[expect(clippy::cast_precision_loss)]
    pub fn facets(&self) -> Result<Vec<ArrayConfig>, SimulationError> {
        self.validate()?;
        let n_columns = self.n_columns();
        let capacity = self.dc_capacity() / n_columns as f64;
        Ok((0..n_columns)
            .map(|index| ArrayConfig {
                capacity,
                orientation: Orientation::vertical(Degrees(
                    360.0 * index as f64 / n_columns as f64,
                )),
            })
            .collect())
    }

    /// Quick estimate: the sunlit share of the whole shell as a single south-facing vertical array,
    /// rated by the panel efficiency at the standard test irradiance.
    pub fn sunlit_array(
        &self,
        sunlit_fraction: f64,
        panel_efficiency: f64,
    ) -> Result<ArrayConfig, SimulationError> {
        for (name, value) in [("diameter", self.diameter), ("height", self.height)] {
            if !(value.is_finite() && value > Meters(0.0)) {
                return Err(SimulationError::invalid_configuration(format!(
                    "tower {name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [("sunlit fraction", sunlit_fraction), ("panel efficiency", panel_efficiency)]
        {
            if !(value > 0.0 && value <= 1.0) {
                return Err(SimulationError::invalid_configuration(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }
        let sunlit_area = self.height * Meters(PI * self.diameter.0) * sunlit_fraction;
        Ok(ArrayConfig {
            capacity: WattsPerSquareMeter::STC * panel_efficiency * sunlit_area,
            orientation: Orientation::vertical(Degrees(180.0)),
        })
    }
}
