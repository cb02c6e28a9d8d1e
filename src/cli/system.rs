//! PV installation.

use clap::Parser;

use crate::{
    prelude::*,
    pv::{
        ArrayConfig,
        Inverter,
        PvSystem,
        irradiance::Orientation,
        temperature::SapmParameters,
        tower::TowerGeometry,
    },
    quantity::{angle::Degrees, irradiance::WattsPerSquareMeter, length::Meters, power::Watts},
};

#[must_use]
#[derive(Parser)]
pub struct TowerArgs {
    #[clap(long = "tower-diameter-meters", env = "TOWER_DIAMETER_METERS", default_value = "0.6")]
    pub diameter: Meters,

    #[clap(long = "tower-height-meters", env = "TOWER_HEIGHT_METERS", default_value = "12")]
    pub height: Meters,

    #[clap(long = "panel-width-meters", env = "PANEL_WIDTH_METERS", default_value = "0.1")]
    pub panel_width: Meters,

    #[clap(long = "panel-height-meters", env = "PANEL_HEIGHT_METERS", default_value = "1")]
    pub panel_height: Meters,

    /// Nameplate DC power per square meter of panels.
    #[clap(long = "power-density", env = "POWER_DENSITY", default_value = "175")]
    pub power_density: WattsPerSquareMeter,
}

impl TowerArgs {
    pub const fn geometry(&self) -> TowerGeometry {
        TowerGeometry {
            diameter: self.diameter,
            height: self.height,
            panel_width: self.panel_width,
            panel_height: self.panel_height,
            power_density: self.power_density,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Layout {
    /// Vertical panel columns around the tower.
    Tower,

    /// Single fixed array.
    Fixed,

    /// Sunlit share of the tower shell as one south-facing vertical array.
    Sunlit,
}

/// Module construction for the cell temperature model.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Mounting {
    GlassPolymer,
    GlassGlass,
}

impl Mounting {
    const fn sapm_parameters(self) -> SapmParameters {
        match self {
            Self::GlassPolymer => SapmParameters::OPEN_RACK_GLASS_POLYMER,
            Self::GlassGlass => SapmParameters::OPEN_RACK_GLASS_GLASS,
        }
    }
}

#[must_use]
#[derive(Parser)]
pub struct SystemArgs {
    #[clap(flatten)]
    pub tower: TowerArgs,

    #[clap(long, env = "LAYOUT", default_value = "tower")]
    pub layout: Layout,

    /// DC nameplate of the fixed array.
    #[clap(long = "capacity-watts", env = "CAPACITY_WATTS", default_value = "4000")]
    pub fixed_capacity: Watts,

    /// Share of the tower shell in the sun, for the sunlit layout.
    #[clap(long, env = "SUNLIT_FRACTION", default_value = "0.7")]
    pub sunlit_fraction: f64,

    /// Panel efficiency at the standard test conditions, for the sunlit layout.
    #[clap(long, env = "PANEL_EFFICIENCY", default_value = "0.15")]
    pub panel_efficiency: f64,

    /// Fixed array tilt from the horizontal.
    #[clap(long, env = "TILT", default_value = "35")]
    pub tilt: Degrees,

    /// Fixed array azimuth, clockwise from the north.
    #[clap(long, env = "AZIMUTH", default_value = "180")]
    pub azimuth: Degrees,

    /// Flat AC loss factor: shading, soiling, wiring.
    #[clap(long, env = "DERATING", default_value = "0.85")]
    pub derating: f64,

    /// Relative DC power change per degree Celsius above 25 °C.
    #[clap(
        long,
        env = "TEMPERATURE_COEFFICIENT",
        default_value = "-0.004",
        allow_negative_numbers = true
    )]
    pub temperature_coefficient: f64,

    /// Open-rack module construction.
    #[clap(long, env = "MOUNTING", default_value = "glass-polymer")]
    pub mounting: Mounting,

    /// Ground reflectance.
    #[clap(long, env = "ALBEDO", default_value = "0.2")]
    pub albedo: f64,

    /// Inverter AC limit, defaults to the DC nameplate at the nominal efficiency.
    #[clap(long = "inverter-ac-limit-watts", env = "INVERTER_AC_LIMIT_WATTS")]
    pub inverter_ac_limit: Option<Watts>,
}

impl SystemArgs {
    pub fn build(&self) -> Result<PvSystem> {
        let arrays = match self.layout {
            Layout::Tower => self.tower.geometry().facets()?,
            Layout::Fixed => vec![ArrayConfig {
                capacity: self.fixed_capacity,
                orientation: Orientation { tilt: self.tilt, azimuth: self.azimuth },
            }],
            Layout::Sunlit => {
                vec![self.tower.geometry().sunlit_array(self.sunlit_fraction, self.panel_efficiency)?]
            }
        };
        let system = PvSystem::builder()
            .arrays(arrays)
            .derating(self.derating)
            .temperature_coefficient(self.temperature_coefficient)
            .albedo(self.albedo)
            .cell_temperature(self.mounting.sapm_parameters())
            .inverter(Inverter { ac_limit: self.inverter_ac_limit, ..Inverter::default() })
            .build()?;
        info!(
            layout = ?self.layout,
            n_arrays = system.arrays.len(),
            dc_capacity = ?system.dc_capacity(),
            "built the PV system",
        );
        Ok(system)
    }
}
